//! Route registration
//! Builds the public and protected routers and applies the middleware stack

use axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::{
    auth::middleware::{require_role, session_middleware},
    handlers,
    middleware::AppState,
    models::user::Role,
};

/// Profile payloads are small; anything bigger is not a legitimate request
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Probes
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // Registration and login need no session; logout only clears the cookie
    let auth_routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/logout", post(handlers::auth::logout));

    // Own-profile endpoints: any authenticated role
    let me_routes = Router::new()
        .route(
            "/api/users/me",
            get(handlers::user::get_profile).patch(handlers::user::update_profile),
        )
        .route("/api/users/me/password", patch(handlers::user::change_password));

    // Directory endpoints: coarse role gates here, target-aware rules in
    // the policy inside each handler
    let staff_routes = Router::new()
        .route(
            "/api/users",
            get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::user::get_user)
                .patch(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route("/api/users/{id}/active", patch(handlers::user::toggle_active))
        .route_layer(from_fn(require_role(&[Role::Admin, Role::Employee])));

    let admin_routes = Router::new()
        .route("/api/users/{id}/role", patch(handlers::user::change_role))
        .route_layer(from_fn(require_role(&[Role::Admin])));

    // The session middleware wraps every protected route and runs before
    // the role gates
    let protected_routes = Router::new()
        .merge(me_routes)
        .merge(staff_routes)
        .merge(admin_routes)
        .layer(from_fn_with_state(state.clone(), session_middleware));

    let cors = cors_layer(&state);

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(protected_routes)
        .layer(from_fn(crate::middleware::request_tracking_middleware))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

/// Credentialed CORS for the SPA origin; wildcard origins cannot carry
/// cookies, so the origin is pinned from config
fn cors_layer(state: &AppState) -> CorsLayer {
    let origin = state
        .config
        .server
        .cors_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
