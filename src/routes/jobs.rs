use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    engine::{EvidenceSubmission, JobDetail, JobDraft, Upload},
    error::{AppError, AppResult},
    filter::{DepartmentFilter, JobListing, JobQuery, StatusFilter},
    lifecycle::JobAction,
    models::Job,
    routes::{feedback::FeedbackPayload, Confirmed},
    schedule::Schedule,
    state::AppState,
};

#[derive(Deserialize)]
pub struct JobListQuery {
    pub query: Option<String>,
    pub status: Option<String>,
    pub department_id: Option<i32>,
    #[serde(default)]
    pub mine: bool,
}

impl JobListQuery {
    fn into_query(self) -> AppResult<JobQuery> {
        let status = match self.status.as_deref() {
            Some(value) => value
                .parse::<StatusFilter>()
                .map_err(|err| AppError::bad_request(err.to_string()))?,
            None => StatusFilter::All,
        };
        Ok(JobQuery {
            text: self.query.unwrap_or_default(),
            status,
            department: self
                .department_id
                .map(DepartmentFilter::from)
                .unwrap_or_default(),
            mine_only: self.mine,
        })
    }
}

/// Create/edit form as posted by the dashboard. A set `end_date` on another
/// day makes the job multi-day and `time_slot` is then ignored.
#[derive(Deserialize)]
pub struct JobForm {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub map_link: Option<String>,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    #[serde(default)]
    pub department_ids: Vec<i32>,
    #[serde(default)]
    pub team: Vec<Uuid>,
    #[serde(default)]
    pub is_feedback_required: bool,
}

impl From<JobForm> for JobDraft {
    fn from(form: JobForm) -> Self {
        JobDraft {
            schedule: Schedule::from_input(form.date, form.end_date, form.time_slot.as_deref()),
            title: form.title,
            description: form.description,
            location: form.location,
            map_link: form.map_link,
            customer_name: form.customer_name,
            customer_phone: form.customer_phone,
            department_ids: form.department_ids,
            team: form.team,
            is_feedback_required: form.is_feedback_required,
        }
    }
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub action: JobAction,
}

pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<JobListing>>> {
    let query = params.into_query()?;
    let listings = state.engine.list_jobs(&user.actor, &query).await?;
    Ok(Json(listings))
}

pub async fn create_job(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Confirmed(confirm): Confirmed,
    Json(form): Json<JobForm>,
) -> AppResult<(StatusCode, Json<JobListing>)> {
    let listing = state
        .engine
        .create_job(&user.actor, form.into(), &confirm)
        .await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthenticatedUser,
) -> AppResult<Json<JobDetail>> {
    Ok(Json(state.engine.job_detail(&user.actor, id).await?))
}

pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthenticatedUser,
    Confirmed(confirm): Confirmed,
    Json(form): Json<JobForm>,
) -> AppResult<Json<JobListing>> {
    let listing = state
        .engine
        .update_job(&user.actor, id, form.into(), &confirm)
        .await?;
    Ok(Json(listing))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthenticatedUser,
    Confirmed(confirm): Confirmed,
) -> AppResult<StatusCode> {
    state.engine.delete_job(&user.actor, id, &confirm).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthenticatedUser,
    Confirmed(confirm): Confirmed,
    Json(payload): Json<StatusRequest>,
) -> AppResult<Json<Job>> {
    let job = state
        .engine
        .transition(&user.actor, id, payload.action, &confirm)
        .await?;
    Ok(Json(job))
}

pub async fn submit_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthenticatedUser,
    Confirmed(confirm): Confirmed,
    mut multipart: Multipart,
) -> AppResult<Json<Job>> {
    let mut evidence = Vec::new();
    let mut feedback: Option<FeedbackPayload> = None;
    let mut signature_file: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        error!(job_id = id, error = %err, "invalid multipart data");
        AppError::bad_request(format!("invalid multipart data: {err}"))
    })? {
        let name = field.name().map(|n| n.to_string());
        match name.as_deref() {
            Some("evidence") => {
                let file_name = field.file_name().map(|n| n.to_string());
                let content_type = field.content_type().map(|mime| mime.to_string());
                let data = field.bytes().await.map_err(|err| {
                    error!(job_id = id, error = %err, "failed to read evidence bytes");
                    AppError::bad_request(format!("failed to read evidence file: {err}"))
                })?;
                evidence.push(Upload {
                    file_name,
                    content_type,
                    bytes: data.to_vec(),
                });
            }
            Some("feedback") => {
                let value = field.text().await.map_err(|err| {
                    AppError::bad_request(format!("invalid feedback field: {err}"))
                })?;
                if !value.trim().is_empty() {
                    feedback = Some(serde_json::from_str(&value).map_err(|err| {
                        AppError::bad_request(format!("feedback must be valid JSON: {err}"))
                    })?);
                }
            }
            Some("signature") => {
                let data = field.bytes().await.map_err(|err| {
                    AppError::bad_request(format!("failed to read signature: {err}"))
                })?;
                if !data.is_empty() {
                    signature_file = Some(data.to_vec());
                }
            }
            _ => {}
        }
    }

    let feedback = match feedback {
        Some(payload) => Some(payload.into_form(signature_file)?),
        None => None,
    };
    info!(job_id = id, files = evidence.len(), with_feedback = feedback.is_some(), "evidence submission received");

    let job = state
        .engine
        .submit_evidence(
            &user.actor,
            id,
            EvidenceSubmission { evidence, feedback },
            &confirm,
        )
        .await?;
    Ok(Json(job))
}
