//! User repository (database access layer)
//! The narrow directory interface the auth core consumes, plus the CRUD
//! the management endpoints need.

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, RegisterRequest, UpdateUserRequest, User},
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Sort columns the listing endpoint may interpolate into ORDER BY
const SORTABLE_COLUMNS: &[&str] = &["created_at", "username", "email", "firstname", "lastname"];

/// Filters applied to a directory listing
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub role: Option<String>,
    pub active: Option<bool>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub descending: bool,
    pub limit: i64,
    pub offset: i64,
}

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Look a subject up by username or email (login identifier)
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE username = $1 OR email = $1"
        )
        .bind(identifier)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Look a subject up by ID
    pub async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Find any subject claiming one of the given unique fields. Used for
    /// duplicate checks before create/update.
    pub async fn find_by_any_unique_field(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        ssn: Option<&str>,
    ) -> Result<Option<User>, AppError> {
        if username.is_none() && email.is_none() && ssn.is_none() {
            return Ok(None);
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NOT NULL AND username = $1)
               OR ($2::text IS NOT NULL AND email = $2)
               OR ($3::text IS NOT NULL AND ssn = $3)
            LIMIT 1
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(ssn)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// First admin account, if any (used by the seeding binary)
    pub async fn find_any_admin(&self) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'admin' LIMIT 1"
        )
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Insert a self-registered citizen
    pub async fn create_citizen(
        &self,
        req: &RegisterRequest,
        password_hash: &str,
    ) -> Result<User, AppError> {
        self.insert(
            &req.username,
            &req.email,
            password_hash,
            "citizen",
            &req.firstname,
            &req.lastname,
            &req.phone_number,
            &req.address.city,
            &req.address.street,
            &req.address.number,
            &req.address.postcode,
            &req.ssn,
        )
        .await
    }

    /// Insert a staff-created subject with an explicit role
    pub async fn create(
        &self,
        req: &CreateUserRequest,
        password_hash: &str,
    ) -> Result<User, AppError> {
        self.insert(
            &req.username,
            &req.email,
            password_hash,
            req.role.as_str(),
            &req.firstname,
            &req.lastname,
            &req.phone_number,
            &req.address.city,
            &req.address.street,
            &req.address.number,
            &req.address.postcode,
            &req.ssn,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: &str,
        firstname: &str,
        lastname: &str,
        phone_number: &str,
        city: &str,
        street: &str,
        number: &str,
        postcode: &str,
        ssn: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                id, username, email, password_hash, role, active,
                firstname, lastname, phone_number,
                city, street, number, postcode, ssn
            )
            VALUES ($1, $2, $3, $4, $5, TRUE, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .bind(firstname)
        .bind(lastname)
        .bind(phone_number)
        .bind(city)
        .bind(street)
        .bind(number)
        .bind(postcode)
        .bind(ssn)
        .fetch_one(&self.db)
        .await?;

        Ok(user)
    }

    /// Partial profile update; absent fields keep their stored values
    pub async fn update(&self, id: Uuid, req: &UpdateUserRequest) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                firstname = COALESCE($4, firstname),
                lastname = COALESCE($5, lastname),
                phone_number = COALESCE($6, phone_number),
                city = COALESCE($7, city),
                street = COALESCE($8, street),
                number = COALESCE($9, number),
                postcode = COALESCE($10, postcode),
                ssn = COALESCE($11, ssn),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.firstname)
        .bind(&req.lastname)
        .bind(&req.phone_number)
        .bind(req.address.as_ref().map(|a| a.city.as_str()))
        .bind(req.address.as_ref().map(|a| a.street.as_str()))
        .bind(req.address.as_ref().map(|a| a.number.as_str()))
        .bind(req.address.as_ref().map(|a| a.postcode.as_str()))
        .bind(&req.ssn)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Flip the active flag
    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(active)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Reassign the role
    pub async fn set_role(&self, id: Uuid, role: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Replace the stored credential hash
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a subject
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Filtered, sorted, paginated listing
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<User>, AppError> {
        let sort_column = filter
            .sort_by
            .as_deref()
            .filter(|col| SORTABLE_COLUMNS.contains(col))
            .unwrap_or("created_at");
        let direction = if filter.descending { "DESC" } else { "ASC" };

        // Only the whitelisted column name is interpolated; everything else
        // is a bind parameter
        let query = format!(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::bool IS NULL OR active = $2)
              AND ($3::text IS NULL
                   OR username ILIKE $3 OR email ILIKE $3
                   OR firstname ILIKE $3 OR lastname ILIKE $3)
            ORDER BY {} {}
            LIMIT $4 OFFSET $5
            "#,
            sort_column, direction
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(&filter.role)
            .bind(filter.active)
            .bind(filter.search.as_deref().map(search_pattern))
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.db)
            .await?;

        Ok(users)
    }

    /// Number of subjects matching the listing filters
    pub async fn count(&self, filter: &ListFilter) -> Result<i64, AppError> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) FROM users
            WHERE ($1::text IS NULL OR role = $1)
              AND ($2::bool IS NULL OR active = $2)
              AND ($3::text IS NULL
                   OR username ILIKE $3 OR email ILIKE $3
                   OR firstname ILIKE $3 OR lastname ILIKE $3)
            "#,
        )
        .bind(&filter.role)
        .bind(filter.active)
        .bind(filter.search.as_deref().map(search_pattern))
        .fetch_one(&self.db)
        .await?
        .get(0);

        Ok(count)
    }
}

/// Contains-match with ILIKE wildcards escaped out of the needle
fn search_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}
