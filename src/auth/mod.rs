pub mod jwt;
pub mod local;
pub mod password;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{NewProfile, Profile};
use crate::roles::{Actor, ApprovalStatus, Role};
use crate::state::AppState;
use crate::store::{JobStore, StoreError};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("account is pending administrator approval")]
    PendingApproval,
    #[error("no profile exists for this account")]
    MissingProfile,
    #[error("unauthorized")]
    Unauthorized,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("auth provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
    pub expires_in: i64,
}

#[async_trait]
pub trait AuthProvider: Send + Sync + 'static {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
    async fn current_user(&self, access_token: &str) -> Result<AuthUser, AuthError>;
}

/// `{username}@{domain}`, the address the provider knows the account by.
pub fn synthetic_email(username: &str, domain: &str) -> Result<String, AuthError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(AuthError::Invalid("username must not be empty".into()));
    }
    if username
        .chars()
        .any(|c| c.is_whitespace() || c == '@' || c.is_control())
    {
        return Err(AuthError::Invalid(
            "username must not contain spaces or '@'".into(),
        ));
    }
    Ok(format!("{username}@{domain}"))
}

#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub profile: Profile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub department_id: Option<i32>,
}

pub struct Accounts {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn JobStore>,
    email_domain: String,
}

impl Accounts {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn JobStore>,
        email_domain: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            email_domain: email_domain.into(),
        }
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = synthetic_email(username, &self.email_domain)?;
        let session = self.provider.sign_in(&email, password).await?;

        let profile = match self.store.get_profile(session.user.id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                self.discard(&session).await;
                return Err(AuthError::MissingProfile);
            }
            Err(err) => {
                self.discard(&session).await;
                return Err(err.into());
            }
        };

        if !profile.is_approved() {
            info!(user_id = %profile.id, "rejected sign-in for unapproved profile");
            self.discard(&session).await;
            return Err(AuthError::PendingApproval);
        }
        if profile.role().is_none() {
            self.discard(&session).await;
            return Err(AuthError::Invalid(format!(
                "profile has unknown role '{}'",
                profile.role
            )));
        }

        info!(user_id = %profile.id, username = %profile.username, "signed in");
        Ok(SignedIn {
            access_token: session.access_token,
            token_type: "Bearer".to_string(),
            expires_in: session.expires_in,
            profile,
        })
    }

    /// Creates the identity, then a pending staff profile for it. The two
    /// calls are independent; a profile failure leaves the identity behind.
    pub async fn sign_up(&self, request: SignUp) -> Result<Profile, AuthError> {
        let email = synthetic_email(&request.username, &self.email_domain)?;
        if request.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Invalid(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let full_name = request.full_name.trim();
        if full_name.is_empty() {
            return Err(AuthError::Invalid("full name must not be empty".into()));
        }
        if let Some(department_id) = request.department_id {
            let departments = self.store.list_departments().await?;
            if !departments.iter().any(|department| department.id == department_id) {
                return Err(AuthError::Invalid(format!(
                    "department {department_id} does not exist"
                )));
            }
        }

        let user = self.provider.sign_up(&email, &request.password).await?;
        let profile = NewProfile {
            id: user.id,
            username: request.username.trim().to_lowercase(),
            full_name: full_name.to_string(),
            phone: request
                .phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
            role: Role::Staff.as_str().to_string(),
            status: ApprovalStatus::Pending.as_str().to_string(),
            department_id: request.department_id,
        };

        match self.store.insert_profile(profile).await {
            Ok(profile) => {
                info!(user_id = %profile.id, username = %profile.username, "registered pending profile");
                Ok(profile)
            }
            Err(StoreError::Conflict(_)) => Err(AuthError::UsernameTaken),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.provider.sign_out(access_token).await
    }

    /// Resolves a bearer token to the acting user. Unapproved profiles are
    /// refused even with a valid token.
    pub async fn resolve(&self, access_token: &str) -> Result<(Actor, Profile), AuthError> {
        let user = self.provider.current_user(access_token).await?;
        let profile = self
            .store
            .get_profile(user.id)
            .await?
            .ok_or(AuthError::MissingProfile)?;
        match Actor::from_profile(&profile) {
            Some(actor) => Ok((actor, profile)),
            None if !profile.is_approved() => Err(AuthError::PendingApproval),
            None => Err(AuthError::Unauthorized),
        }
    }

    async fn discard(&self, session: &AuthSession) {
        if let Err(err) = self.provider.sign_out(&session.access_token).await {
            warn!(user_id = %session.user.id, error = %err, "failed to sign out rejected session");
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub actor: Actor,
    pub profile: Profile,
    pub access_token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let (actor, profile) = state.accounts.resolve(bearer.token()).await?;

        Ok(AuthenticatedUser {
            actor,
            profile,
            access_token: bearer.token().to_string(),
        })
    }
}
