use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    error::AppResult,
    models::{Department, Profile},
    routes::Confirmed,
    state::AppState,
};

#[derive(Deserialize)]
pub struct ProfileQuery {
    pub department_id: Option<i32>,
}

/// Open to anonymous callers.
pub async fn list_departments(State(state): State<AppState>) -> AppResult<Json<Vec<Department>>> {
    Ok(Json(state.engine.departments().await?))
}

pub async fn list_profiles(
    State(state): State<AppState>,
    Query(query): Query<ProfileQuery>,
    user: AuthenticatedUser,
) -> AppResult<Json<Vec<Profile>>> {
    let profiles = state
        .engine
        .profiles(&user.actor, query.department_id)
        .await?;
    Ok(Json(profiles))
}

pub async fn approve_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: AuthenticatedUser,
    Confirmed(confirm): Confirmed,
) -> AppResult<Json<Profile>> {
    let profile = state
        .engine
        .approve_profile(&user.actor, id, &confirm)
        .await?;
    Ok(Json(profile))
}
