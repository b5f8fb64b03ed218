//! User repository for database operations.

use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::error::{UserStoreError, UserStoreResult};
use super::models::{User, UserChanges, UserRole};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

/// Repository for user database operations.
///
/// Passwords arrive here already hashed; the repository never sees plaintext.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user and return the stored row.
    #[instrument(skip(self, password_hash))]
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> UserStoreResult<User> {
        debug!("Creating user: {}", email);

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .execute(&self.pool)
        .await
        .map_err(|e| UserStoreError::from_write(e, Some(email)))?;

        let id = result.last_insert_rowid();
        self.get(id).await?.ok_or(UserStoreError::NotFound(id))
    }

    /// Get a user by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> UserStoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get a user by email.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &str) -> UserStoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// List every user, oldest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> UserStoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Apply `changes` to a user. `changes.password` must already be hashed.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: UserChanges) -> UserStoreResult<User> {
        let existing = self.get(id).await?.ok_or(UserStoreError::NotFound(id))?;

        let mut updates = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(name) = changes.name {
            updates.push("name = ?");
            values.push(name);
        }

        if let Some(ref email) = changes.email {
            updates.push("email = ?");
            values.push(email.clone());
        }

        if let Some(password_hash) = changes.password {
            updates.push("password_hash = ?");
            values.push(password_hash);
        }

        if let Some(role) = changes.role {
            updates.push("role = ?");
            values.push(role.to_string());
        }

        if updates.is_empty() {
            return Ok(existing);
        }

        updates.push("updated_at = datetime('now')");

        let sql = format!("UPDATE users SET {} WHERE id = ?", updates.join(", "));

        let mut query_builder = sqlx::query(&sql);
        for value in &values {
            query_builder = query_builder.bind(value);
        }
        query_builder = query_builder.bind(id);

        query_builder
            .execute(&self.pool)
            .await
            .map_err(|e| UserStoreError::from_write(e, changes.email.as_deref()))?;

        self.get(id).await?.ok_or(UserStoreError::NotFound(id))
    }

    /// Delete a user and return the removed row.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> UserStoreResult<User> {
        let deleted = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        deleted.ok_or(UserStoreError::NotFound(id))
    }

    /// Count total users.
    #[instrument(skip(self))]
    pub async fn count(&self) -> UserStoreResult<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}
