use async_trait::async_trait;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::jwt::JwtService;
use super::password::{hash_password, verify_password};
use super::{AuthError, AuthProvider, AuthSession, AuthUser};
use crate::db::PgPool;
use crate::models::{NewSession, NewUser, Session, User};
use crate::schema::{sessions, users};
use crate::store::StoreError;

/// Auth provider backed by the `users` and `sessions` tables. Access tokens
/// are JWTs naming a session row, so sign-out takes effect immediately.
#[derive(Clone)]
pub struct PgAuth {
    pool: PgPool,
    jwt: JwtService,
}

impl PgAuth {
    pub fn new(pool: PgPool, jwt: JwtService) -> Self {
        Self { pool, jwt }
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T, AuthError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, AuthError> + Send + 'static,
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
        .map_err(|err| AuthError::Store(StoreError::Task(err.to_string())))?
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn store_err(err: diesel::result::Error) -> AuthError {
    AuthError::Store(StoreError::from(err))
}

#[async_trait]
impl AuthProvider for PgAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.to_string();
        let user: User = self
            .with_conn(move |conn| {
                users::table
                    .filter(users::email.eq(&email))
                    .first::<User>(conn)
                    .optional()
                    .map_err(store_err)?
                    .ok_or(AuthError::InvalidCredentials)
            })
            .await?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;
        if !valid {
            return Err(AuthError::InvalidCredentials);
        }

        let session_id = Uuid::new_v4();
        let access_token = self.jwt.generate_token(user.id, session_id, &user.email)?;
        let now = Utc::now();
        let new_session = NewSession {
            id: session_id,
            user_id: user.id,
            token_hash: hash_token(&access_token),
            issued_at: now.naive_utc(),
            expires_at: (now + self.jwt.expiry()).naive_utc(),
        };

        self.with_conn(move |conn| {
            diesel::insert_into(sessions::table)
                .values(&new_session)
                .execute(conn)
                .map_err(store_err)
        })
        .await?;

        Ok(AuthSession {
            user: AuthUser {
                id: user.id,
                email: user.email,
            },
            access_token,
            expires_in: self.jwt.expiry().num_seconds(),
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let new_user = NewUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: hash_password(password)?,
        };
        let user = AuthUser {
            id: new_user.id,
            email: new_user.email.clone(),
        };

        self.with_conn(move |conn| {
            match diesel::insert_into(users::table)
                .values(&new_user)
                .execute(conn)
            {
                Ok(_) => Ok(()),
                Err(diesel::result::Error::DatabaseError(
                    diesel::result::DatabaseErrorKind::UniqueViolation,
                    _,
                )) => Err(AuthError::UsernameTaken),
                Err(err) => Err(store_err(err)),
            }
        })
        .await?;

        Ok(user)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self
            .jwt
            .verify_token(access_token)
            .map_err(|_| AuthError::Unauthorized)?;
        let now = Utc::now().naive_utc();

        self.with_conn(move |conn| {
            diesel::update(
                sessions::table
                    .filter(sessions::id.eq(claims.sid))
                    .filter(sessions::revoked_at.is_null()),
            )
            .set(sessions::revoked_at.eq(now))
            .execute(conn)
            .map_err(store_err)?;
            Ok(())
        })
        .await
    }

    async fn current_user(&self, access_token: &str) -> Result<AuthUser, AuthError> {
        let claims = self
            .jwt
            .verify_token(access_token)
            .map_err(|_| AuthError::Unauthorized)?;
        let token_hash = hash_token(access_token);
        let now = Utc::now().naive_utc();

        let session: Session = self
            .with_conn(move |conn| {
                sessions::table
                    .filter(sessions::id.eq(claims.sid))
                    .filter(sessions::token_hash.eq(&token_hash))
                    .filter(sessions::revoked_at.is_null())
                    .filter(sessions::expires_at.gt(now))
                    .first::<Session>(conn)
                    .optional()
                    .map_err(store_err)?
                    .ok_or(AuthError::Unauthorized)
            })
            .await?;

        Ok(AuthUser {
            id: session.user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::hash_token;

    #[test]
    fn token_hash_is_stable_hex() {
        let hash = hash_token("abc");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("abc"));
        assert_ne!(hash, hash_token("abd"));
    }
}
