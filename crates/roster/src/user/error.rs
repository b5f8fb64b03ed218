//! User persistence errors.

use thiserror::Error;

/// Errors surfaced by the user repository and service.
#[derive(Debug, Error)]
pub enum UserStoreError {
    /// No user with this id.
    #[error("User not found: {0}")]
    NotFound(i64),

    /// Email is already registered to another account.
    #[error("User with this email already exists: {0}")]
    EmailTaken(String),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password could not be hashed.
    #[error("failed to hash password: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

impl UserStoreError {
    /// Map a write failure, turning a UNIQUE violation on `email` into `EmailTaken`.
    pub(crate) fn from_write(err: sqlx::Error, email: Option<&str>) -> Self {
        match (&err, email) {
            (sqlx::Error::Database(db), Some(email)) if db.is_unique_violation() => {
                Self::EmailTaken(email.to_string())
            }
            _ => Self::Database(err),
        }
    }
}

pub type UserStoreResult<T> = Result<T, UserStoreError>;
