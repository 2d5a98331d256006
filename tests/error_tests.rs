//! Error taxonomy unit tests
//!
//! Status mapping, generic client messages and the structured validation
//! field list

use axum::http::StatusCode;
use citizen_registry::auth::jwt::TokenError;
use citizen_registry::error::{AppError, ErrorDetail, ErrorResponse, FieldError};

// ==================== Status codes ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Validation(vec![]).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(
        AppError::BadRequest("dup".to_string()).status_code(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(AppError::Authentication.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::TokenMissing.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::SubjectInactive.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        AppError::Token(TokenError::Expired).status_code(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(AppError::Forbidden("nope").status_code(), StatusCode::FORBIDDEN);
    assert_eq!(
        AppError::NotFound("user".to_string()).status_code(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        AppError::Internal("boom".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Config("bad".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

/// Missing token (401, re-login) and invalid token (403, give up) must stay
/// distinguishable for clients
#[test]
fn test_missing_and_invalid_token_are_distinct() {
    assert_ne!(
        AppError::TokenMissing.status_code(),
        AppError::Token(TokenError::MalformedSignature).status_code()
    );
}

// ==================== Client messages ====================

#[test]
fn test_authentication_failure_is_generic() {
    // Never reveals whether the identifier or the password was wrong
    assert_eq!(AppError::Authentication.user_message(), "Login failed");
}

#[test]
fn test_token_errors_echo_the_reason() {
    let message = AppError::Token(TokenError::Expired).user_message();
    assert!(message.contains("expired"));

    let message = AppError::Token(TokenError::MalformedSignature).user_message();
    assert!(message.contains("signature"));
}

#[test]
fn test_forbidden_carries_the_denied_reason() {
    let message = AppError::Forbidden("employees may only manage citizen records").user_message();
    assert!(message.contains("employees may only manage citizen records"));
}

#[test]
fn test_server_errors_hide_detail() {
    let error = AppError::Database(sqlx::Error::RowNotFound);
    let message = error.user_message();
    assert_eq!(message, "Database error occurred");
    assert!(!message.to_lowercase().contains("sqlx"));

    let error = AppError::Internal("connection pool exhausted at worker 3".to_string());
    assert_eq!(error.user_message(), "Internal server error");
}

// ==================== Validation flattening ====================

#[test]
fn test_validation_response_includes_fields() {
    let response = ErrorResponse {
        error: ErrorDetail {
            code: 400,
            message: "Validation failed".to_string(),
            request_id: "test".to_string(),
            fields: Some(vec![FieldError {
                field: "email".to_string(),
                message: "Invalid email format".to_string(),
            }]),
        },
    };

    let value = serde_json::to_value(&response).unwrap();
    assert_eq!(value["error"]["fields"][0]["field"], "email");
}

#[test]
fn test_non_validation_response_omits_fields() {
    let response = ErrorResponse {
        error: ErrorDetail {
            code: 404,
            message: "Resource not found: user".to_string(),
            request_id: "test".to_string(),
            fields: None,
        },
    };

    let value = serde_json::to_value(&response).unwrap();
    assert!(value["error"].get("fields").is_none());
}
