//! Authentication service: credential checks and token issuance

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    auth::{jwt::TokenService, password::PasswordHasher},
    error::AppError,
    models::{auth::LoginRequest, user::User},
    repository::UserRepository,
};

pub struct AuthService {
    db: PgPool,
    token_service: Arc<TokenService>,
    hasher: Arc<PasswordHasher>,
}

impl AuthService {
    pub fn new(db: PgPool, token_service: Arc<TokenService>, hasher: Arc<PasswordHasher>) -> Self {
        Self {
            db,
            token_service,
            hasher,
        }
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown identifier, wrong password and inactive account all collapse
    /// into the same generic failure so the response never reveals which
    /// part was wrong.
    pub async fn login(&self, req: LoginRequest) -> Result<(String, User), AppError> {
        let repo = UserRepository::new(self.db.clone());

        let user = match repo.find_by_identifier(&req.username_or_email).await? {
            Some(user) => user,
            None => {
                tracing::info!("Login attempt for unknown identifier");
                return Err(AppError::Authentication);
            }
        };

        // The Argon2 comparison is CPU-bound; run it off the async workers
        // so one slow verification cannot stall unrelated requests
        let hasher = self.hasher.clone();
        let password = req.password;
        let stored_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?;

        if !matches {
            tracing::info!(subject = %user.id, "Login attempt with wrong credentials");
            return Err(AppError::Authentication);
        }

        if !user.active {
            tracing::info!(subject = %user.id, "Login attempt for inactive account");
            return Err(AppError::Authentication);
        }

        let token = self.issue_token_for(&user)?;

        tracing::info!(subject = %user.id, username = %user.username, "Login successful");

        Ok((token, user))
    }

    /// Mint a session token for an already-authenticated subject
    pub fn issue_token_for(&self, user: &User) -> Result<String, AppError> {
        self.token_service.issue(&user.identity())
    }
}
