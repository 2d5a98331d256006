//! User directory service: creation, listing, updates and lifecycle

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::{
        password::PasswordHasher,
        policy::Identity,
    },
    error::AppError,
    models::user::{
        ChangePasswordRequest, CreateUserRequest, ListUsersQuery, Pagination, RegisterRequest,
        Role, UpdateUserRequest, User, UserPage, UserResponse,
    },
    repository::{ListFilter, UserRepository},
};

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

pub struct UserService {
    db: PgPool,
    hasher: Arc<PasswordHasher>,
}

impl UserService {
    pub fn new(db: PgPool, hasher: Arc<PasswordHasher>) -> Self {
        Self { db, hasher }
    }

    /// Self-service registration; every account created here is a citizen
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        let repo = UserRepository::new(self.db.clone());

        self.reject_duplicates(&repo, None, Some(&req.username), Some(&req.email), Some(&req.ssn))
            .await?;

        let password_hash = self.hash_password(req.password.clone()).await?;

        let user = repo
            .create_citizen(&req, &password_hash)
            .await
            .map_err(map_unique_violation)?;

        tracing::info!(subject = %user.id, username = %user.username, "User registered");

        Ok(user)
    }

    /// Staff-side creation with an explicit role (the policy has already
    /// decided whether the caller may assign that role)
    pub async fn create(&self, req: CreateUserRequest) -> Result<User, AppError> {
        let repo = UserRepository::new(self.db.clone());

        self.reject_duplicates(&repo, None, Some(&req.username), Some(&req.email), Some(&req.ssn))
            .await?;

        let password_hash = self.hash_password(req.password.clone()).await?;

        let user = repo
            .create(&req, &password_hash)
            .await
            .map_err(map_unique_violation)?;

        tracing::info!(
            subject = %user.id,
            username = %user.username,
            role = %user.role,
            "User created"
        );

        Ok(user)
    }

    /// Filtered, paginated directory listing. Employees only ever see
    /// citizens, whatever filter they ask for.
    pub async fn list(&self, actor: &Identity, query: ListUsersQuery) -> Result<UserPage, AppError> {
        let repo = UserRepository::new(self.db.clone());

        let page = query.page.unwrap_or(1).max(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);

        let role = if actor.role == Role::Employee {
            Some(Role::Citizen.as_str().to_string())
        } else {
            query.role.map(|r| r.as_str().to_string())
        };

        let filter = ListFilter {
            role,
            active: query.active,
            search: query.search.filter(|s| !s.trim().is_empty()),
            sort_by: query.sort_by,
            descending: query.sort_order.as_deref() != Some("asc"),
            limit: limit as i64,
            offset: (page as i64 - 1) * limit as i64,
        };

        let users = repo.list(&filter).await?;
        let total = repo.count(&filter).await?;
        let pages = ((total + limit as i64 - 1) / limit as i64).max(0) as u32;

        Ok(UserPage {
            data: users.into_iter().map(UserResponse::from).collect(),
            pagination: Pagination {
                total,
                page,
                limit,
                pages,
            },
        })
    }

    /// Fetch one subject or 404
    pub async fn get(&self, id: Uuid) -> Result<User, AppError> {
        let repo = UserRepository::new(self.db.clone());

        repo.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))
    }

    /// Partial profile update with uniqueness re-checks
    pub async fn update(&self, id: Uuid, req: UpdateUserRequest) -> Result<User, AppError> {
        let repo = UserRepository::new(self.db.clone());

        if req.is_empty() {
            return Err(AppError::bad_request("No fields to update"));
        }

        self.reject_duplicates(
            &repo,
            Some(id),
            req.username.as_deref(),
            req.email.as_deref(),
            req.ssn.as_deref(),
        )
        .await?;

        let user = repo
            .update(id, &req)
            .await
            .map_err(map_unique_violation)?
            .ok_or_else(|| AppError::not_found("user"))?;

        tracing::info!(subject = %user.id, "User updated");

        Ok(user)
    }

    /// Flip the active flag, returning the updated record
    pub async fn toggle_active(&self, id: Uuid) -> Result<User, AppError> {
        let repo = UserRepository::new(self.db.clone());

        let current = self.get(id).await?;

        let user = repo
            .set_active(id, !current.active)
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        tracing::info!(subject = %user.id, active = user.active, "User active flag toggled");

        Ok(user)
    }

    /// Reassign a subject's role
    pub async fn change_role(&self, id: Uuid, role: Role) -> Result<User, AppError> {
        let repo = UserRepository::new(self.db.clone());

        let user = repo
            .set_role(id, role.as_str())
            .await?
            .ok_or_else(|| AppError::not_found("user"))?;

        tracing::info!(subject = %user.id, role = %user.role, "User role changed");

        Ok(user)
    }

    /// Delete a subject; deleting the acting account is rejected
    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> Result<(), AppError> {
        if actor_id == id {
            return Err(AppError::bad_request("Cannot delete your own account"));
        }

        let repo = UserRepository::new(self.db.clone());

        if !repo.delete(id).await? {
            return Err(AppError::not_found("user"));
        }

        tracing::info!(subject = %id, "User deleted");

        Ok(())
    }

    /// Verify the old password and store a hash of the new one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let repo = UserRepository::new(self.db.clone());

        let user = self.get(user_id).await?;

        let hasher = self.hasher.clone();
        let old_password = req.old_password;
        let stored_hash = user.password_hash.clone();
        let matches =
            tokio::task::spawn_blocking(move || hasher.verify(&old_password, &stored_hash))
                .await
                .map_err(|e| {
                    AppError::Internal(format!("Password verification task failed: {}", e))
                })?;

        if !matches {
            return Err(AppError::bad_request("Old password is incorrect"));
        }

        let new_hash = self.hash_password(req.new_password).await?;
        repo.update_password(user_id, &new_hash).await?;

        tracing::info!(subject = %user_id, "Password changed");

        Ok(())
    }

    /// Hash on the blocking pool; Argon2 is deliberately expensive
    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// Fail when one of the unique fields is already claimed by a
    /// different subject
    async fn reject_duplicates(
        &self,
        repo: &UserRepository,
        exclude: Option<Uuid>,
        username: Option<&str>,
        email: Option<&str>,
        ssn: Option<&str>,
    ) -> Result<(), AppError> {
        let Some(existing) = repo.find_by_any_unique_field(username, email, ssn).await? else {
            return Ok(());
        };

        if exclude == Some(existing.id) {
            return Ok(());
        }

        // On registration, an inactive clash gets a distinct support hint
        if exclude.is_none() && !existing.active {
            return Err(AppError::bad_request(
                "An account with this email, username, or SSN exists but is currently inactive. Please contact support.",
            ));
        }

        // Updates name the clashing field; creation keeps it generic
        if exclude.is_some() {
            if username.is_some() && username == Some(existing.username.as_str()) {
                return Err(AppError::bad_request("Username already exists"));
            }
            if email.is_some() && email == Some(existing.email.as_str()) {
                return Err(AppError::bad_request("Email already exists"));
            }
            if ssn.is_some() && ssn == Some(existing.ssn.as_str()) {
                return Err(AppError::bad_request("SSN already exists"));
            }
        }

        Err(AppError::bad_request(
            "User with provided username, email, or SSN already exists",
        ))
    }
}

/// A unique-constraint race at insert time reads the same as the pre-check
fn map_unique_violation(err: AppError) -> AppError {
    match err {
        AppError::Database(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            AppError::bad_request("User with provided username, email, or SSN already exists")
        }
        other => other,
    }
}
