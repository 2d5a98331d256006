//! Session token minting and verification
//! Stateless HS256 tokens; there is no server-side session store, so a
//! token's lifetime is fully determined by its embedded expiry.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{auth::policy::Identity, config::AppConfig, error::AppError, models::user::Role};

/// Typed verification failure. Callers branch on this; nothing is thrown
/// past the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,
    #[error("token signature is invalid")]
    MalformedSignature,
    #[error("token payload is malformed")]
    MalformedPayload,
}

/// Claim set embedded in every session token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub username: String,

    pub email: String,

    /// Role at issuance time
    pub role: String,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,
}

impl Claims {
    /// Resolve the claims back into an Identity
    pub fn into_identity(self) -> Result<Identity, TokenError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| TokenError::MalformedPayload)?;

        Ok(Identity {
            id,
            username: self.username,
            email: self.email,
            role: Role::from(self.role.as_str()),
        })
    }
}

/// Token service
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: u64,
}

impl TokenService {
    /// Create the service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // Ensure secret is long enough for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self::from_secret(secret, config.security.token_ttl_secs))
    }

    /// Fixed secret and TTL; tests use this directly
    pub fn from_secret(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a token for the given identity
    pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue with an explicit clock, so expiry behavior stays testable
    pub fn issue_at(
        &self,
        identity: &Identity,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let expires_at = issued_at + Duration::seconds(self.ttl_secs as i64);

        let claims = Claims {
            sub: identity.id.to_string(),
            username: identity.username.clone(),
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode session token: {:?}", e);
            AppError::Internal(format!("Failed to encode session token: {}", e))
        })
    }

    /// Check signature and expiry, returning the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                let kind = e.into_kind();
                tracing::debug!(?kind, "Token verification failed");
                match kind {
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    ErrorKind::InvalidSignature
                    | ErrorKind::InvalidAlgorithm
                    | ErrorKind::InvalidAlgorithmName => TokenError::MalformedSignature,
                    _ => TokenError::MalformedPayload,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            role: Role::Citizen,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::from_secret("test_secret_key_32_characters_long!", 3600);
        let identity = test_identity();

        let token = service.issue(&identity).unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, identity.id.to_string());
        assert_eq!(claims.username, "testuser");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.role, "citizen");
    }

    #[test]
    fn test_garbage_token_fails() {
        let service = TokenService::from_secret("test_secret_key_32_characters_long!", 3600);
        assert!(service.verify("not_a_token").is_err());
        assert!(service.verify("").is_err());
    }

    #[test]
    fn test_expired_token() {
        let service = TokenService::from_secret("test_secret_key_32_characters_long!", 60);
        let identity = test_identity();

        // Issued two hours in the past, 60s TTL
        let token = service
            .issue_at(&identity, Utc::now() - Duration::hours(2))
            .unwrap();

        assert_eq!(service.verify(&token).unwrap_err(), TokenError::Expired);
    }
}
