//! Authorization policy unit tests
//!
//! The full decision matrix: role hierarchy, the admin-only override for
//! role changes and deletions, and the self-access tie-break

mod common;

use citizen_registry::auth::policy::{can_access, Action, Target};
use citizen_registry::models::user::Role;
use uuid::Uuid;

fn target(role: Role) -> Target {
    Target::subject(Uuid::new_v4(), role)
}

// ==================== Rule 1: unauthenticated ====================

#[test]
fn test_unauthenticated_gets_register_and_login_only() {
    assert!(can_access(None, Action::Register, None).allow);
    assert!(can_access(None, Action::Login, None).allow);

    assert!(!can_access(None, Action::ListUsers, None).allow);
    assert!(!can_access(None, Action::ReadUser, Some(&target(Role::Citizen))).allow);
    assert!(!can_access(None, Action::DeleteUser, Some(&target(Role::Citizen))).allow);
}

// ==================== Rule 2: admin ====================

#[test]
fn test_admin_is_allowed_everything() {
    let admin = common::identity_with_role(Role::Admin);

    for action in [
        Action::ListUsers,
        Action::CreateUser,
        Action::ReadUser,
        Action::UpdateUser,
        Action::ToggleActive,
        Action::ChangeRole,
        Action::DeleteUser,
    ] {
        for role in [Role::Admin, Role::Employee, Role::Citizen] {
            let decision = can_access(Some(&admin), action, Some(&target(role)));
            assert!(decision.allow, "admin should be allowed {:?} on {:?}", action, role);
        }
    }
}

// ==================== Rule 5 override: role change / delete ====================

#[test]
fn test_role_change_is_admin_only_regardless_of_target() {
    let employee = common::identity_with_role(Role::Employee);
    let citizen = common::identity_with_role(Role::Citizen);

    // Even over citizen targets, and even over oneself
    assert!(!can_access(Some(&employee), Action::ChangeRole, Some(&target(Role::Citizen))).allow);
    assert!(!can_access(
        Some(&employee),
        Action::ChangeRole,
        Some(&Target::subject(employee.id, Role::Employee))
    )
    .allow);
    assert!(!can_access(Some(&citizen), Action::ChangeRole, Some(&target(Role::Citizen))).allow);
}

#[test]
fn test_delete_is_admin_only_regardless_of_target() {
    let employee = common::identity_with_role(Role::Employee);
    let citizen = common::identity_with_role(Role::Citizen);

    assert!(!can_access(Some(&employee), Action::DeleteUser, Some(&target(Role::Citizen))).allow);

    // The override even beats self-access
    assert!(!can_access(
        Some(&citizen),
        Action::DeleteUser,
        Some(&Target::subject(citizen.id, Role::Citizen))
    )
    .allow);
}

// ==================== Self-access tie-break ====================

#[test]
fn test_everyone_reaches_their_own_record() {
    for role in [Role::Admin, Role::Employee, Role::Citizen] {
        let actor = common::identity_with_role(role);
        let own = Target::subject(actor.id, role);

        assert!(can_access(Some(&actor), Action::ReadUser, Some(&own)).allow);
        assert!(can_access(Some(&actor), Action::UpdateUser, Some(&own)).allow);
        assert!(can_access(Some(&actor), Action::ChangePassword, Some(&own)).allow);
    }
}

#[test]
fn test_self_access_beats_role_scoping_for_employees() {
    // An employee is not a citizen, so rule 3 alone would deny this;
    // the self rule must win first
    let employee = common::identity_with_role(Role::Employee);
    let own = Target::subject(employee.id, Role::Employee);

    assert!(can_access(Some(&employee), Action::ReadUser, Some(&own)).allow);
    assert!(can_access(Some(&employee), Action::UpdateUser, Some(&own)).allow);
}

// ==================== Rule 3: employees ====================

#[test]
fn test_employee_reads_and_writes_citizens_only() {
    let employee = common::identity_with_role(Role::Employee);

    assert!(can_access(Some(&employee), Action::ReadUser, Some(&target(Role::Citizen))).allow);
    assert!(can_access(Some(&employee), Action::UpdateUser, Some(&target(Role::Citizen))).allow);
    assert!(can_access(Some(&employee), Action::ToggleActive, Some(&target(Role::Citizen))).allow);

    assert!(!can_access(Some(&employee), Action::ReadUser, Some(&target(Role::Admin))).allow);
    assert!(!can_access(Some(&employee), Action::ReadUser, Some(&target(Role::Employee))).allow);
    assert!(!can_access(Some(&employee), Action::UpdateUser, Some(&target(Role::Admin))).allow);
    assert!(!can_access(Some(&employee), Action::ToggleActive, Some(&target(Role::Admin))).allow);
}

#[test]
fn test_employee_may_list_users() {
    let employee = common::identity_with_role(Role::Employee);
    assert!(can_access(Some(&employee), Action::ListUsers, None).allow);
}

#[test]
fn test_employee_creates_citizens_only() {
    let employee = common::identity_with_role(Role::Employee);

    assert!(can_access(
        Some(&employee),
        Action::CreateUser,
        Some(&Target::with_role(Role::Citizen))
    )
    .allow);

    // Elevation attempts are denied at decision time, before anything is
    // persisted
    assert!(!can_access(
        Some(&employee),
        Action::CreateUser,
        Some(&Target::with_role(Role::Employee))
    )
    .allow);
    assert!(!can_access(
        Some(&employee),
        Action::CreateUser,
        Some(&Target::with_role(Role::Admin))
    )
    .allow);
}

// ==================== Rule 4: citizens ====================

#[test]
fn test_citizen_reads_self_but_not_others() {
    let citizen = common::identity_with_role(Role::Citizen);
    let own = Target::subject(citizen.id, Role::Citizen);

    assert!(can_access(Some(&citizen), Action::ReadUser, Some(&own)).allow);
    assert!(!can_access(Some(&citizen), Action::ReadUser, Some(&target(Role::Citizen))).allow);
}

#[test]
fn test_citizen_gets_no_directory_operations() {
    let citizen = common::identity_with_role(Role::Citizen);

    assert!(!can_access(Some(&citizen), Action::ListUsers, None).allow);
    assert!(!can_access(
        Some(&citizen),
        Action::CreateUser,
        Some(&Target::with_role(Role::Citizen))
    )
    .allow);
    assert!(!can_access(Some(&citizen), Action::ToggleActive, Some(&target(Role::Citizen))).allow);
    assert!(!can_access(Some(&citizen), Action::UpdateUser, Some(&target(Role::Citizen))).allow);
}

// ==================== Decisions carry reasons ====================

#[test]
fn test_every_decision_has_a_reason() {
    let citizen = common::identity_with_role(Role::Citizen);

    let allowed = can_access(Some(&citizen), Action::ReadUser, Some(&Target::subject(citizen.id, Role::Citizen)));
    assert!(allowed.allow);
    assert!(!allowed.reason.is_empty());

    let denied = can_access(Some(&citizen), Action::ListUsers, None);
    assert!(!denied.allow);
    assert!(!denied.reason.is_empty());
}
