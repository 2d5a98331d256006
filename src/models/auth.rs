//! Authentication-related models

use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::user::{validate_password_strength, EMAIL_RE};

/// Login body. A single field carries either the username or the email.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(custom(function = validate_username_or_email))]
    pub username_or_email: String,

    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = validate_password_strength)
    )]
    pub password: String,
}

impl LoginRequest {
    pub fn normalize(&mut self) {
        self.username_or_email = self.username_or_email.trim().to_string();
        self.password = self.password.trim().to_string();
    }
}

/// Either a well-formed email or a username between 2 and 20 characters
fn validate_username_or_email(value: &str) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if EMAIL_RE.is_match(value) || (2..=20).contains(&len) {
        Ok(())
    } else {
        let mut err = ValidationError::new("username_or_email");
        err.message =
            Some("Must be a valid email or a username between 2 and 20 characters".into());
        Err(err)
    }
}
