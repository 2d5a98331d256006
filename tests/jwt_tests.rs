//! Token service unit tests
//!
//! Round-trip, expiry, tamper and wrong-key behavior

mod common;

use chrono::{Duration, Utc};
use citizen_registry::auth::jwt::{Claims, TokenError, TokenService};
use citizen_registry::auth::policy::Identity;
use citizen_registry::models::user::Role;
use uuid::Uuid;

fn service() -> TokenService {
    TokenService::from_secret(common::TEST_SECRET, 3600)
}

fn identity() -> Identity {
    Identity {
        id: Uuid::new_v4(),
        username: "kpapadaki".to_string(),
        email: "k.papadaki@example.com".to_string(),
        role: Role::Employee,
    }
}

// ==================== Round-trip ====================

#[test]
fn test_issue_then_verify_preserves_claims() {
    let service = service();
    let identity = identity();

    let token = service.issue(&identity).unwrap();
    let claims = service.verify(&token).unwrap();

    assert_eq!(claims.sub, identity.id.to_string());
    assert_eq!(claims.username, identity.username);
    assert_eq!(claims.email, identity.email);
    assert_eq!(claims.role, "employee");
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn test_claims_resolve_back_to_identity() {
    let service = service();
    let identity = identity();

    let token = service.issue(&identity).unwrap();
    let resolved = service.verify(&token).unwrap().into_identity().unwrap();

    assert_eq!(resolved.id, identity.id);
    assert_eq!(resolved.username, identity.username);
    assert_eq!(resolved.email, identity.email);
    assert_eq!(resolved.role, identity.role);
}

#[test]
fn test_from_config_issues_verifiable_tokens() {
    let config = common::create_test_config();
    let service = TokenService::from_config(&config).unwrap();

    let token = service.issue(&identity()).unwrap();
    assert!(service.verify(&token).is_ok());
    assert_eq!(service.ttl_secs(), 300);
}

// ==================== Expiry ====================

#[test]
fn test_expired_token_reports_expired() {
    // 60s TTL, issued two hours ago; the signature itself is still valid
    let service = TokenService::from_secret(common::TEST_SECRET, 60);

    let token = service
        .issue_at(&identity(), Utc::now() - Duration::hours(2))
        .unwrap();

    assert_eq!(service.verify(&token).unwrap_err(), TokenError::Expired);
}

#[test]
fn test_fresh_token_is_not_expired() {
    let service = TokenService::from_secret(common::TEST_SECRET, 3600);

    let token = service.issue_at(&identity(), Utc::now()).unwrap();
    assert!(service.verify(&token).is_ok());
}

// ==================== Signatures ====================

#[test]
fn test_token_from_different_secret_is_rejected() {
    let issuer = TokenService::from_secret("another-secret-key-at-least-32-chars!", 3600);
    let verifier = service();

    let token = issuer.issue(&identity()).unwrap();

    assert_eq!(
        verifier.verify(&token).unwrap_err(),
        TokenError::MalformedSignature
    );
}

#[test]
fn test_tampered_signature_is_rejected() {
    let service = service();
    let token = service.issue(&identity()).unwrap();

    let tampered = flip_char_in_segment(&token, 2);
    assert_eq!(
        service.verify(&tampered).unwrap_err(),
        TokenError::MalformedSignature
    );
}

#[test]
fn test_tampered_payload_is_rejected() {
    let service = service();
    let token = service.issue(&identity()).unwrap();

    // Any bit-level change to the payload invalidates the signature
    let tampered = flip_char_in_segment(&token, 1);
    assert_eq!(
        service.verify(&tampered).unwrap_err(),
        TokenError::MalformedSignature
    );
}

// ==================== Malformed input ====================

#[test]
fn test_garbage_token_is_malformed_payload() {
    let service = service();

    assert_eq!(
        service.verify("definitely-not-a-jwt").unwrap_err(),
        TokenError::MalformedPayload
    );
    assert_eq!(service.verify("").unwrap_err(), TokenError::MalformedPayload);
    assert_eq!(
        service.verify("only.two").unwrap_err(),
        TokenError::MalformedPayload
    );
}

#[test]
fn test_claims_with_bad_subject_are_malformed() {
    let claims = Claims {
        sub: "not-a-uuid".to_string(),
        username: "x".to_string(),
        email: "x@example.com".to_string(),
        role: "citizen".to_string(),
        iat: 0,
        exp: 0,
    };

    assert_eq!(
        claims.into_identity().unwrap_err(),
        TokenError::MalformedPayload
    );
}

#[test]
fn test_unknown_role_in_claims_degrades_to_citizen() {
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        username: "x".to_string(),
        email: "x@example.com".to_string(),
        role: "superuser".to_string(),
        iat: 0,
        exp: 0,
    };

    let identity = claims.into_identity().unwrap();
    assert_eq!(identity.role, Role::Citizen);
}

/// Replace the first character of the given dot-separated segment with a
/// different base64url character
fn flip_char_in_segment(token: &str, segment: usize) -> String {
    let mut parts: Vec<String> = token.split('.').map(String::from).collect();
    assert_eq!(parts.len(), 3, "expected a three-part JWT");

    let first = parts[segment].chars().next().expect("segment is non-empty");
    let replacement = if first == 'A' { 'B' } else { 'A' };
    let rest = parts[segment][1..].to_string();
    parts[segment] = format!("{}{}", replacement, rest);

    parts.join(".")
}
