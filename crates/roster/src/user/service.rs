//! User service for business logic.

use tracing::{info, instrument};

use super::error::{UserStoreError, UserStoreResult};
use super::models::{CreateUserRequest, User, UserChanges, UserRole};
use super::repository::UserRepository;

/// Service for user management operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Create a new user. Email is expected to be normalized already.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_user(&self, request: CreateUserRequest) -> UserStoreResult<User> {
        if self.repo.get_by_email(&request.email).await?.is_some() {
            return Err(UserStoreError::EmailTaken(request.email));
        }

        let password_hash = hash_password(&request.password)?;
        let role = request.role.unwrap_or(UserRole::User);

        let user = self
            .repo
            .create(&request.name, &request.email, &password_hash, role)
            .await?;
        info!(user_id = user.id, role = %user.role, "Created new user");

        Ok(user)
    }

    /// List all users.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> UserStoreResult<Vec<User>> {
        self.repo.list().await
    }

    /// Get a user by ID.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> UserStoreResult<User> {
        self.repo.get(id).await?.ok_or(UserStoreError::NotFound(id))
    }

    /// Update a user.
    #[instrument(skip(self, changes))]
    pub async fn update_user(&self, id: i64, changes: UserChanges) -> UserStoreResult<User> {
        // Surface a missing target before any conflict check.
        self.get_user(id).await?;

        if let Some(email) = &changes.email {
            if let Some(existing) = self.repo.get_by_email(email).await? {
                if existing.id != id {
                    return Err(UserStoreError::EmailTaken(email.clone()));
                }
            }
        }

        let mut processed = changes;
        if let Some(password) = &processed.password {
            processed.password = Some(hash_password(password)?);
        }

        let user = self.repo.update(id, processed).await?;
        info!(user_id = user.id, "Updated user");

        Ok(user)
    }

    /// Delete a user, returning the removed record.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> UserStoreResult<User> {
        let user = self.repo.delete(id).await?;
        info!(user_id = id, "Deleted user");

        Ok(user)
    }

    /// Count users.
    #[instrument(skip(self))]
    pub async fn count_users(&self) -> UserStoreResult<i64> {
        self.repo.count().await
    }
}

/// Hash a password using bcrypt.
fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    // Use a lower cost factor for development speed
    let cost = if cfg!(debug_assertions) { 4 } else { 10 };
    bcrypt::hash(password, cost)
}
