use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt::Display;
use tracing::error;

use crate::auth::AuthError;
use crate::engine::EngineError;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn precondition_required() -> Self {
        Self::new(
            StatusCode::PRECONDITION_REQUIRED,
            "confirmation required: resend with 'x-confirm: true'",
        )
    }

    pub fn internal<E: Display>(error: E) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status;
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self.message, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(what) => AppError::not_found(format!("{what} not found")),
            StoreError::Conflict(message) => AppError::conflict(message),
            other => AppError::internal(other),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::Validation(message) => AppError::bad_request(message),
            EngineError::Declined => AppError::precondition_required(),
            err @ (EngineError::Forbidden(_) | EngineError::NotAssigned(_)) => {
                AppError::forbidden(err.to_string())
            }
            err @ EngineError::NotFound(_) => AppError::not_found(err.to_string()),
            err @ (EngineError::Transition(_) | EngineError::Locked { .. }) => {
                AppError::conflict(err.to_string())
            }
            EngineError::Store(err) => err.into(),
            err @ (EngineError::Storage(_) | EngineError::Partial { .. }) => {
                AppError::internal(err)
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        match value {
            err @ (AuthError::InvalidCredentials | AuthError::Unauthorized) => {
                AppError::new(StatusCode::UNAUTHORIZED, err.to_string())
            }
            err @ (AuthError::PendingApproval | AuthError::MissingProfile) => {
                AppError::forbidden(err.to_string())
            }
            err @ AuthError::UsernameTaken => AppError::conflict(err.to_string()),
            AuthError::Invalid(message) => AppError::bad_request(message),
            AuthError::Store(err) => err.into(),
            err @ AuthError::Provider(_) => AppError::internal(err),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        AppError::internal(format!("{value:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{JobAction, JobStatus, TransitionError};

    #[test]
    fn engine_errors_map_to_statuses() {
        let cases = [
            (EngineError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (EngineError::Declined, StatusCode::PRECONDITION_REQUIRED),
            (EngineError::NotAssigned(1), StatusCode::FORBIDDEN),
            (EngineError::NotFound("job 1".into()), StatusCode::NOT_FOUND),
            (
                EngineError::Transition(TransitionError::NotAllowed {
                    from: JobStatus::Pending,
                    action: JobAction::Approve,
                }),
                StatusCode::CONFLICT,
            ),
            (
                EngineError::Locked {
                    id: 1,
                    status: "APPROVED".into(),
                },
                StatusCode::CONFLICT,
            ),
            (EngineError::Storage("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        assert_eq!(
            AppError::from(AuthError::PendingApproval).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::UsernameTaken).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn store_not_found_is_404() {
        let err = AppError::from(StoreError::NotFound("job 9".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.message, "job 9 not found");
    }
}
