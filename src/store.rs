use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use uuid::Uuid;

use crate::db::PgPool;
use crate::models::{
    Assignment, Department, Feedback, Job, JobChanges, NewAssignment, NewFeedback, NewJob,
    NewProfile, Profile,
};
use crate::roles::ApprovalStatus;
use crate::schema::{departments, job_assignments, job_feedbacks, jobs, profiles};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("database pool error: {0}")]
    Pool(String),
    #[error("database task failed: {0}")]
    Task(String),
}

impl From<DieselError> for StoreError {
    fn from(value: DieselError) -> Self {
        match value {
            DieselError::NotFound => StoreError::NotFound("record".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Conflict(info.message().to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Record collections the engine reads and writes. Every call is an
/// independent round trip; nothing here spans calls in a transaction.
#[async_trait]
pub trait JobStore: Send + Sync + 'static {
    /// All jobs, latest start first.
    async fn list_jobs(&self) -> StoreResult<Vec<Job>>;
    async fn get_job(&self, id: i64) -> StoreResult<Option<Job>>;
    async fn insert_job(&self, job: NewJob) -> StoreResult<Job>;
    async fn update_job(&self, id: i64, changes: JobChanges) -> StoreResult<Job>;
    async fn delete_job(&self, id: i64) -> StoreResult<()>;

    async fn list_assignments(&self, job_id: Option<i64>) -> StoreResult<Vec<Assignment>>;
    async fn delete_assignments(&self, job_id: i64) -> StoreResult<usize>;
    async fn insert_assignments(&self, rows: Vec<NewAssignment>) -> StoreResult<usize>;

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>>;
    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>>;
    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile>;
    async fn set_profile_status(&self, id: Uuid, status: ApprovalStatus) -> StoreResult<Profile>;

    async fn list_departments(&self) -> StoreResult<Vec<Department>>;
    async fn insert_department(&self, name: &str) -> StoreResult<Department>;

    async fn feedback_for_job(&self, job_id: i64) -> StoreResult<Option<Feedback>>;
    async fn insert_feedback(&self, feedback: NewFeedback) -> StoreResult<Feedback>;
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| StoreError::Pool(err.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|err| StoreError::Task(err.to_string()))?
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn list_jobs(&self) -> StoreResult<Vec<Job>> {
        self.with_conn(|conn| {
            Ok(jobs::table
                .order((jobs::start_time.desc(), jobs::id.desc()))
                .load(conn)?)
        })
        .await
    }

    async fn get_job(&self, id: i64) -> StoreResult<Option<Job>> {
        self.with_conn(move |conn| Ok(jobs::table.find(id).first(conn).optional()?))
            .await
    }

    async fn insert_job(&self, job: NewJob) -> StoreResult<Job> {
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(jobs::table)
                .values(&job)
                .get_result(conn)?)
        })
        .await
    }

    async fn update_job(&self, id: i64, mut changes: JobChanges) -> StoreResult<Job> {
        changes.updated_at = Some(Utc::now().naive_utc());
        self.with_conn(move |conn| {
            diesel::update(jobs::table.find(id))
                .set(&changes)
                .get_result(conn)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("job {id}")))
        })
        .await
    }

    async fn delete_job(&self, id: i64) -> StoreResult<()> {
        self.with_conn(move |conn| {
            let deleted = diesel::delete(jobs::table.find(id)).execute(conn)?;
            if deleted == 0 {
                return Err(StoreError::NotFound(format!("job {id}")));
            }
            Ok(())
        })
        .await
    }

    async fn list_assignments(&self, job_id: Option<i64>) -> StoreResult<Vec<Assignment>> {
        self.with_conn(move |conn| {
            let mut query = job_assignments::table.into_boxed();
            if let Some(job_id) = job_id {
                query = query.filter(job_assignments::job_id.eq(job_id));
            }
            Ok(query.order(job_assignments::assigned_at.asc()).load(conn)?)
        })
        .await
    }

    async fn delete_assignments(&self, job_id: i64) -> StoreResult<usize> {
        self.with_conn(move |conn| {
            Ok(
                diesel::delete(job_assignments::table.filter(job_assignments::job_id.eq(job_id)))
                    .execute(conn)?,
            )
        })
        .await
    }

    async fn insert_assignments(&self, rows: Vec<NewAssignment>) -> StoreResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(job_assignments::table)
                .values(&rows)
                .execute(conn)?)
        })
        .await
    }

    async fn list_profiles(&self) -> StoreResult<Vec<Profile>> {
        self.with_conn(|conn| {
            Ok(profiles::table
                .order(profiles::full_name.asc())
                .load(conn)?)
        })
        .await
    }

    async fn get_profile(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        self.with_conn(move |conn| Ok(profiles::table.find(id).first(conn).optional()?))
            .await
    }

    async fn insert_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(profiles::table)
                .values(&profile)
                .get_result(conn)?)
        })
        .await
    }

    async fn set_profile_status(&self, id: Uuid, status: ApprovalStatus) -> StoreResult<Profile> {
        self.with_conn(move |conn| {
            diesel::update(profiles::table.find(id))
                .set(profiles::status.eq(status.as_str()))
                .get_result(conn)
                .optional()?
                .ok_or_else(|| StoreError::NotFound(format!("profile {id}")))
        })
        .await
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        self.with_conn(|conn| {
            Ok(departments::table
                .order(departments::name.asc())
                .load(conn)?)
        })
        .await
    }

    async fn insert_department(&self, name: &str) -> StoreResult<Department> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(departments::table)
                .values(departments::name.eq(&name))
                .get_result(conn)?)
        })
        .await
    }

    async fn feedback_for_job(&self, job_id: i64) -> StoreResult<Option<Feedback>> {
        self.with_conn(move |conn| {
            Ok(job_feedbacks::table
                .filter(job_feedbacks::job_id.eq(job_id))
                .order(job_feedbacks::created_at.asc())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn insert_feedback(&self, feedback: NewFeedback) -> StoreResult<Feedback> {
        self.with_conn(move |conn| {
            Ok(diesel::insert_into(job_feedbacks::table)
                .values(&feedback)
                .get_result(conn)?)
        })
        .await
    }
}
