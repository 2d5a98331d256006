//! Session extraction middleware
//! Pulls the token from the `token` cookie (preferred) or the
//! `Authorization: Bearer` header, verifies it, re-checks the subject
//! against the directory and attaches the resolved Identity to the request.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::{
    auth::policy::Identity, error::AppError, middleware::AppState, models::user::Role,
    repository::UserRepository,
};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "token";

// Handlers extract the Identity that the session middleware attached
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(AppError::TokenMissing)
    }
}

/// Token from the session cookie, falling back to the bearer header
pub fn extract_token(headers: &HeaderMap, cookies: &Cookies) -> Result<String, AppError> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let value = cookie.value().to_string();
        if !value.is_empty() {
            return Ok(value);
        }
    }

    bearer_token(headers).ok_or(AppError::TokenMissing)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

/// Per-request decision chain: no token -> 401, failed verification -> 403,
/// deactivated or deleted subject -> 401, otherwise the Identity is
/// attached and the request proceeds. No state survives the request.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers(), &cookies)?;

    let claims = state.token_service.verify(&token)?;
    let identity = claims.into_identity()?;

    // The token may outlive the account; the directory has the last word
    let repo = UserRepository::new(state.db.clone());
    let subject = repo
        .find_by_id(&identity.id)
        .await?
        .ok_or(AppError::SubjectInactive)?;

    if !subject.active {
        tracing::warn!(subject = %identity.id, "Rejected token for deactivated account");
        return Err(AppError::SubjectInactive);
    }

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Authorization gate factory: only the listed roles pass. Target-aware
/// decisions stay with the policy inside the handlers; this is the coarse
/// per-route gate.
pub fn require_role(
    allowed: &'static [Role],
) -> impl Fn(Request, Next) -> BoxFuture<'static, Result<Response, AppError>> + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let identity = req
                .extensions()
                .get::<Identity>()
                .cloned()
                .ok_or(AppError::TokenMissing)?;

            if !allowed.contains(&identity.role) {
                tracing::warn!(
                    actor = %identity.id,
                    role = %identity.role,
                    "Role gate rejected request"
                );
                return Err(AppError::Forbidden("insufficient role"));
            }

            Ok(next.run(req).await)
        })
    }
}
