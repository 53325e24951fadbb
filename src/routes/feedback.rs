use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    engine::{decode_signature, FeedbackForm, PublicJobSummary, Ratings},
    error::AppResult,
    models::Feedback,
    routes::Confirmed,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct FeedbackPayload {
    pub ratings: Ratings,
    pub suggestion: Option<String>,
    /// `data:image/png;base64,...` export of the signature pad.
    #[serde(default)]
    pub signature: Option<String>,
}

impl FeedbackPayload {
    pub fn into_form(self, signature_file: Option<Vec<u8>>) -> AppResult<FeedbackForm> {
        let signature_png = match signature_file {
            Some(bytes) => bytes,
            None => decode_signature(self.signature.as_deref().unwrap_or_default())?,
        };
        Ok(FeedbackForm {
            ratings: self.ratings,
            suggestion: self.suggestion,
            signature_png,
        })
    }
}

pub async fn public_job(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PublicJobSummary>> {
    Ok(Json(state.engine.public_job_summary(id).await?))
}

pub async fn submit_feedback(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Confirmed(confirm): Confirmed,
    Json(payload): Json<FeedbackPayload>,
) -> AppResult<(StatusCode, Json<Feedback>)> {
    let form = payload.into_form(None)?;
    let feedback = state
        .engine
        .submit_public_feedback(id, form, &confirm)
        .await?;
    Ok((StatusCode::CREATED, Json(feedback)))
}
