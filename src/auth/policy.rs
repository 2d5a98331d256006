//! Authorization policy
//! The single ordered-rule decision function that every protected operation
//! consults. First matching rule wins; there are no per-endpoint role
//! conditionals anywhere else in the crate.

use uuid::Uuid;

use crate::{error::AppError, models::user::Role};

/// Authenticated actor, resolved from a verified session token
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Operations the policy decides over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    Login,
    ListUsers,
    CreateUser,
    ReadUser,
    UpdateUser,
    ChangePassword,
    ToggleActive,
    ChangeRole,
    DeleteUser,
}

/// The subject an action is aimed at. `id` is `None` for creation, where
/// only the requested role exists yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub id: Option<Uuid>,
    pub role: Role,
}

impl Target {
    pub fn subject(id: Uuid, role: Role) -> Self {
        Self { id: Some(id), role }
    }

    /// A not-yet-existing subject with the requested role
    pub fn with_role(role: Role) -> Self {
        Self { id: None, role }
    }
}

/// Outcome of one policy decision; computed per request, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allow: bool,
    pub reason: &'static str,
}

impl AccessDecision {
    fn allow(reason: &'static str) -> Self {
        Self { allow: true, reason }
    }

    fn deny(reason: &'static str) -> Self {
        Self { allow: false, reason }
    }
}

/// Decide whether `actor` may perform `action` on `target`.
///
/// Rules, in evaluation order:
/// 1. Unauthenticated actors get registration and login, nothing else.
/// 2. Admins may do anything to anyone.
/// 3. Role changes and deletions are admin-only, whatever the target.
/// 4. An actor always reads/updates their own record and password.
/// 5. Employees manage citizen records only; citizens get nothing further.
pub fn can_access(
    actor: Option<&Identity>,
    action: Action,
    target: Option<&Target>,
) -> AccessDecision {
    let Some(actor) = actor else {
        return match action {
            Action::Register | Action::Login => AccessDecision::allow("public endpoint"),
            _ => AccessDecision::deny("authentication required"),
        };
    };

    if actor.role == Role::Admin {
        return AccessDecision::allow("admin");
    }

    if matches!(action, Action::ChangeRole | Action::DeleteUser) {
        return AccessDecision::deny("role changes and deletions require admin");
    }

    // Self-access wins over role scoping, so a citizen can always work
    // with their own profile
    if matches!(action, Action::ReadUser | Action::UpdateUser | Action::ChangePassword) {
        if let Some(target) = target {
            if target.id.is_some() && target.id == Some(actor.id) {
                return AccessDecision::allow("own record");
            }
        }
    }

    if actor.role == Role::Employee {
        return match action {
            Action::ListUsers => AccessDecision::allow("employee directory access"),
            Action::CreateUser | Action::ReadUser | Action::UpdateUser | Action::ToggleActive => {
                match target {
                    Some(target) if target.role == Role::Citizen => {
                        AccessDecision::allow("citizen record")
                    }
                    _ => AccessDecision::deny("employees may only manage citizen records"),
                }
            }
            _ => AccessDecision::deny("insufficient role"),
        };
    }

    // Citizens: everything beyond their own record was already handled
    AccessDecision::deny("citizens may only access their own record")
}

/// Consult the policy and translate a deny into the error taxonomy
pub fn authorize(
    actor: &Identity,
    action: Action,
    target: Option<&Target>,
) -> Result<(), AppError> {
    let decision = can_access(Some(actor), action, target);

    if decision.allow {
        Ok(())
    } else {
        tracing::warn!(
            actor = %actor.id,
            role = %actor.role,
            ?action,
            reason = decision.reason,
            "Access denied"
        );
        Err(AppError::Forbidden(decision.reason))
    }
}
