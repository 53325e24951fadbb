use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::lifecycle::JobStatus;
use crate::roles::{ApprovalStatus, Role};
use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = sessions)]
#[diesel(belongs_to(User))]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub issued_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = departments)]
pub struct Department {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub department_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl Profile {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn approval(&self) -> Option<ApprovalStatus> {
        self.status.parse().ok()
    }

    pub fn is_approved(&self) -> bool {
        self.approval() == Some(ApprovalStatus::Approved)
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub department_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Serialize)]
#[diesel(table_name = jobs)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub location: String,
    pub map_link: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: String,
    pub department_ids: Vec<i32>,
    pub image_url: Option<String>,
    pub is_feedback_required: bool,
    pub assigned_to: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Job {
    /// Stored status parsed into the lifecycle enum. Unknown values surface
    /// as `None` and are treated as locked by callers.
    pub fn lifecycle_status(&self) -> Option<JobStatus> {
        self.status.parse().ok()
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub map_link: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: String,
    pub department_ids: Vec<i32>,
    pub is_feedback_required: bool,
}

/// Partial update of a job row. `updated_at` is always set so the changeset
/// is never empty.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = jobs)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub map_link: Option<Option<String>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub department_ids: Option<Vec<i32>>,
    pub image_url: Option<Option<String>>,
    pub is_feedback_required: Option<bool>,
    pub updated_at: Option<NaiveDateTime>,
}

impl JobChanges {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Queryable, Associations, Serialize)]
#[diesel(table_name = job_assignments)]
#[diesel(belongs_to(Job))]
#[diesel(belongs_to(Profile))]
#[diesel(primary_key(job_id, profile_id))]
pub struct Assignment {
    pub job_id: i64,
    pub profile_id: Uuid,
    pub assigned_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = job_assignments)]
pub struct NewAssignment {
    pub job_id: i64,
    pub profile_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Serialize)]
#[diesel(table_name = job_feedbacks)]
#[diesel(belongs_to(Job))]
pub struct Feedback {
    pub id: i64,
    pub job_id: i64,
    pub rating_politeness: i16,
    pub rating_speed: i16,
    pub rating_quality: i16,
    pub rating_cleanliness: i16,
    pub rating_punctuality: i16,
    pub rating_overall: i16,
    pub suggestion: Option<String>,
    pub signature_url: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = job_feedbacks)]
pub struct NewFeedback {
    pub job_id: i64,
    pub rating_politeness: i16,
    pub rating_speed: i16,
    pub rating_quality: i16,
    pub rating_cleanliness: i16,
    pub rating_punctuality: i16,
    pub rating_overall: i16,
    pub suggestion: Option<String>,
    pub signature_url: String,
}
