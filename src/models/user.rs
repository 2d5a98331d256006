//! User domain models
//! Row type for the `users` table plus the closed, validated request and
//! response DTOs. Request bodies reject unknown keys so nothing unvalidated
//! can reach the policy or persistence layers.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::auth::policy::{Identity, Target};

/// Role of a directory subject. Closed set; anything unknown read back from
/// storage degrades to the least-privileged role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
    Citizen,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
            Role::Citizen => "citizen",
        }
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => Role::Admin,
            "employee" => Role::Employee,
            _ => Role::Citizen,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::from(s.as_str())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Postal address, stored flattened into the users table
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq, sqlx::FromRow)]
#[serde(deny_unknown_fields)]
pub struct Address {
    #[validate(length(min = 2, max = 50, message = "City must be between 2 and 50 characters"))]
    pub city: String,

    #[validate(length(max = 50, message = "Street must be at most 50 characters"))]
    pub street: String,

    #[validate(length(max = 10, message = "Street number must be at most 10 characters"))]
    pub number: String,

    #[validate(regex(path = *POSTCODE_RE, message = "Postcode must be exactly 5 digits"))]
    pub postcode: String,
}

impl Address {
    fn normalize(&mut self) {
        self.city = self.city.trim().to_string();
        self.street = self.street.trim().to_string();
        self.number = self.number.trim().to_string();
        self.postcode = self.postcode.trim().to_string();
    }
}

/// Directory subject row. Never serialized directly; responses go through
/// the DTOs below so `password_hash` cannot leak.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String, // admin, employee, citizen
    pub active: bool,

    pub firstname: String,
    pub lastname: String,
    pub phone_number: String,
    #[sqlx(flatten)]
    pub address: Address,
    pub ssn: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The identity this subject authenticates as
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: Role::from(self.role.as_str()),
        }
    }

    /// The subject viewed as a policy target
    pub fn as_target(&self) -> Target {
        Target {
            id: Some(self.id),
            role: Role::from(self.role.as_str()),
        }
    }
}

// Validation patterns shared by the request DTOs
pub(crate) static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(?:\.[a-zA-Z]{2,})*$").unwrap()
});
pub(crate) static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{10}$").unwrap());
pub(crate) static POSTCODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{5}$").unwrap());
pub(crate) static SSN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{9}$").unwrap());

/// At least one letter, one digit and one special character. The regex
/// crate has no lookahead, so this is spelled out as character-class scans.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| "!@#$%^&*".contains(c));

    if has_letter && has_digit && has_special {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(
            "Password must contain at least one letter, one number, and one special character (!@#$%^&*)"
                .into(),
        );
        Err(err)
    }
}

/// Self-service registration body. Role is not accepted here; every
/// registration produces a citizen.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 20, message = "Username must be between 2 and 20 characters"))]
    pub username: String,

    #[validate(regex(path = *EMAIL_RE, message = "Invalid email format"))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = validate_password_strength)
    )]
    pub password: String,

    #[validate(length(min = 2, max = 50, message = "Firstname must be between 2 and 50 characters"))]
    pub firstname: String,

    #[validate(length(min = 2, max = 50, message = "Lastname must be between 2 and 50 characters"))]
    pub lastname: String,

    #[validate(regex(path = *PHONE_RE, message = "Phone number must be exactly 10 digits"))]
    pub phone_number: String,

    #[validate(nested)]
    pub address: Address,

    #[validate(regex(path = *SSN_RE, message = "SSN must be exactly 9 digits"))]
    pub ssn: String,
}

impl RegisterRequest {
    /// Trim every field and lowercase the email before validation
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.password = self.password.trim().to_string();
        self.firstname = self.firstname.trim().to_string();
        self.lastname = self.lastname.trim().to_string();
        self.phone_number = self.phone_number.trim().to_string();
        self.address.normalize();
        self.ssn = self.ssn.trim().to_string();
    }
}

/// Staff-side creation body: registration fields plus an explicit role.
/// Which roles the caller may assign is the policy's decision, not serde's.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 20, message = "Username must be between 2 and 20 characters"))]
    pub username: String,

    #[validate(regex(path = *EMAIL_RE, message = "Invalid email format"))]
    pub email: String,

    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = validate_password_strength)
    )]
    pub password: String,

    pub role: Role,

    #[validate(length(min = 2, max = 50, message = "Firstname must be between 2 and 50 characters"))]
    pub firstname: String,

    #[validate(length(min = 2, max = 50, message = "Lastname must be between 2 and 50 characters"))]
    pub lastname: String,

    #[validate(regex(path = *PHONE_RE, message = "Phone number must be exactly 10 digits"))]
    pub phone_number: String,

    #[validate(nested)]
    pub address: Address,

    #[validate(regex(path = *SSN_RE, message = "SSN must be exactly 9 digits"))]
    pub ssn: String,
}

impl CreateUserRequest {
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.password = self.password.trim().to_string();
        self.firstname = self.firstname.trim().to_string();
        self.lastname = self.lastname.trim().to_string();
        self.phone_number = self.phone_number.trim().to_string();
        self.address.normalize();
        self.ssn = self.ssn.trim().to_string();
    }
}

/// Partial profile update. Role, active flag and password deliberately have
/// no fields here; they move only through their dedicated endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 20, message = "Username must be between 2 and 20 characters"))]
    pub username: Option<String>,

    #[validate(regex(path = *EMAIL_RE, message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 2, max = 50, message = "Firstname must be between 2 and 50 characters"))]
    pub firstname: Option<String>,

    #[validate(length(min = 2, max = 50, message = "Lastname must be between 2 and 50 characters"))]
    pub lastname: Option<String>,

    #[validate(regex(path = *PHONE_RE, message = "Phone number must be exactly 10 digits"))]
    pub phone_number: Option<String>,

    #[validate(nested)]
    pub address: Option<Address>,

    #[validate(regex(path = *SSN_RE, message = "SSN must be exactly 9 digits"))]
    pub ssn: Option<String>,
}

impl UpdateUserRequest {
    pub fn normalize(&mut self) {
        self.username = self.username.take().map(|s| s.trim().to_string());
        self.email = self.email.take().map(|s| s.trim().to_lowercase());
        self.firstname = self.firstname.take().map(|s| s.trim().to_string());
        self.lastname = self.lastname.take().map(|s| s.trim().to_string());
        self.phone_number = self.phone_number.take().map(|s| s.trim().to_string());
        if let Some(address) = self.address.as_mut() {
            address.normalize();
        }
        self.ssn = self.ssn.take().map(|s| s.trim().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.firstname.is_none()
            && self.lastname.is_none()
            && self.phone_number.is_none()
            && self.address.is_none()
            && self.ssn.is_none()
    }
}

/// Password change body
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub old_password: String,

    #[validate(
        length(min = 8, message = "Password must be at least 8 characters"),
        custom(function = validate_password_strength)
    )]
    pub new_password: String,
}

/// Role change body (admin only)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangeRoleRequest {
    pub role: Role,
}

/// Directory listing query
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub role: Option<Role>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Listing entry; omits the SSN on purpose
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub firstname: String,
    pub lastname: String,
    pub phone_number: String,
    pub address: Address,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            active: user.active,
            firstname: user.firstname,
            lastname: user.lastname,
            phone_number: user.phone_number,
            address: user.address,
            created_at: user.created_at,
        }
    }
}

/// Full single-record view, including the SSN
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub firstname: String,
    pub lastname: String,
    pub phone_number: String,
    pub address: Address,
    pub ssn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            active: user.active,
            firstname: user.firstname,
            lastname: user.lastname,
            phone_number: user.phone_number,
            address: user.address,
            ssn: user.ssn,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Pagination envelope for listings
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: u32,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub data: Vec<UserResponse>,
    pub pagination: Pagination,
}
