//! Authentication HTTP handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;
use tower_cookies::{
    cookie::{time::Duration as CookieDuration, SameSite},
    Cookie, Cookies,
};
use validator::Validate;

use crate::{
    auth::middleware::SESSION_COOKIE,
    error::AppError,
    middleware::AppState,
    models::{
        auth::LoginRequest,
        user::{RegisterRequest, UserProfile},
    },
};

/// Register a new citizen account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.normalize();
    req.validate()?;

    let user = state.user_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "username": user.username,
        })),
    ))
}

/// Verify credentials, set the session cookie and return the token for
/// bearer-header clients
pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(mut req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.normalize();
    req.validate()?;

    let (token, user) = state.auth_service.login(req).await?;

    cookies.add(session_cookie(&token, state.token_service.ttl_secs()));

    Ok(Json(json!({
        "message": "Login successful",
        "token": token,
        "user": UserProfile::from(user),
    })))
}

/// Logout is advisory: the cookie is cleared, but a stateless token stays
/// valid until its expiry
pub async fn logout(cookies: Cookies) -> impl IntoResponse {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookies.remove(cookie);

    Json(json!({ "message": "Logged out successfully" }))
}

/// HTTP-only, strict same-site session cookie
fn session_cookie(token: &str, ttl_secs: u64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Strict);
    cookie.set_path("/");
    cookie.set_max_age(CookieDuration::seconds(ttl_secs as i64));
    cookie
}
