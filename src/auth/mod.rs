//! Authentication and authorization module

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;

pub use jwt::{Claims, TokenError, TokenService};
pub use middleware::{extract_token, require_role, session_middleware, SESSION_COOKIE};
pub use password::PasswordHasher;
pub use policy::{authorize, can_access, AccessDecision, Action, Identity, Target};
