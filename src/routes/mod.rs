use std::convert::Infallible;

use async_trait::async_trait;
use axum::http::{request::Parts, HeaderValue};
use axum::{
    extract::{DefaultBodyLimit, FromRequestParts},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::{auth::AuthenticatedUser, notify::PreConfirmed, state::AppState};

pub mod auth;
pub mod directory;
pub mod feedback;
pub mod health;
pub mod jobs;

/// Header a client sets once the user has accepted the confirmation prompt.
pub const CONFIRM_HEADER: &str = "x-confirm";

#[derive(Debug, Clone, Copy)]
pub struct Confirmed(pub PreConfirmed);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Confirmed {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let accepted = parts
            .headers
            .get(CONFIRM_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        Ok(Confirmed(PreConfirmed(accepted)))
    }
}

fn cors_layer(allowed: Option<&String>) -> CorsLayer {
    let allow_origin = match allowed {
        Some(origins) => {
            let headers: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .filter_map(|value| match value.parse::<HeaderValue>() {
                    Ok(header) => Some(header),
                    Err(err) => {
                        warn!(origin = value, error = %err, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(headers)
        }
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(state.config.cors_allowed_origin.as_ref());

    let auth_routes = Router::new()
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-out", post(auth::sign_out))
        .route("/me", get(auth::me));

    let jobs_routes = Router::new()
        .route("/", get(jobs::list_jobs).post(jobs::create_job))
        .route(
            "/:id",
            get(jobs::get_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
        .route("/:id/status", post(jobs::change_status))
        .route("/:id/submit", post(jobs::submit_job));

    let directory_routes = Router::new()
        .route("/api/profiles", get(directory::list_profiles))
        .route("/api/profiles/:id/approve", post(directory::approve_profile));

    let public_routes = Router::new()
        .route("/jobs/:id", get(feedback::public_job))
        .route("/jobs/:id/feedback", post(feedback::submit_feedback));

    let protected_state = state.clone();
    let protected_routes = Router::new()
        .nest("/api/jobs", jobs_routes)
        .merge(directory_routes)
        .layer(middleware::from_extractor_with_state::<AuthenticatedUser, _>(protected_state));

    Router::new()
        .merge(protected_routes)
        .nest("/api/auth", auth_routes)
        .nest("/api/public", public_routes)
        .route("/api/departments", get(directory::list_departments))
        .route("/api/health", get(health::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 64))
}
