use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthenticatedUser, SignUp, SignedIn},
    error::AppResult,
    models::Profile,
    roles::Actor,
    state::AppState,
};

#[derive(Deserialize)]
pub struct SignInRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct MeResponse {
    pub actor: Actor,
    pub profile: Profile,
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> AppResult<Json<SignedIn>> {
    let signed_in = state
        .accounts
        .sign_in(&payload.username, &payload.password)
        .await?;
    Ok(Json(signed_in))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUp>,
) -> AppResult<(StatusCode, Json<Profile>)> {
    let profile = state.accounts.sign_up(payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn sign_out(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<StatusCode> {
    state.accounts.sign_out(&user.access_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(user: AuthenticatedUser) -> Json<MeResponse> {
    Json(MeResponse {
        actor: user.actor,
        profile: user.profile,
    })
}
