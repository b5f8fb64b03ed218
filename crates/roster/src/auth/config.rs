//! Authentication configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user::UserRole;

/// Secrets shorter than this are rejected outside dev mode.
const MIN_SECRET_LEN: usize = 32;

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Enable development mode (accepts the `X-Dev-User` header).
    pub dev_mode: bool,

    /// JWT secret for HS256. Accepts `env:VAR_NAME` to read from the environment.
    /// Required when dev_mode is false.
    pub jwt_secret: Option<String>,

    /// Identities accepted via `X-Dev-User` (dev mode only).
    pub dev_users: Vec<DevUser>,

    /// Allowed CORS origins. If empty, cross-origin requests are rejected.
    pub allowed_origins: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            jwt_secret: None,
            dev_users: Vec::new(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:8080".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    /// Resolve the JWT secret, expanding `env:VAR_NAME` syntax.
    pub fn resolve_jwt_secret(&self) -> Result<Option<String>, ConfigValidationError> {
        match &self.jwt_secret {
            None => Ok(None),
            Some(value) => match value.strip_prefix("env:") {
                Some(var_name) => match std::env::var(var_name) {
                    Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
                    Ok(_) => Err(ConfigValidationError::EnvVarEmpty(var_name.to_string())),
                    Err(_) => Err(ConfigValidationError::EnvVarNotFound(var_name.to_string())),
                },
                None => Ok(Some(value.clone())),
            },
        }
    }

    /// Validate the configuration for the current mode.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let secret = self.resolve_jwt_secret()?;

        match secret {
            None if !self.dev_mode => Err(ConfigValidationError::MissingJwtSecret),
            Some(secret) if !self.dev_mode && secret.len() < MIN_SECRET_LEN => {
                Err(ConfigValidationError::JwtSecretTooShort)
            }
            _ => Ok(()),
        }
    }

    /// Generate a random 64-character secret suitable for `jwt_secret`.
    pub fn generate_jwt_secret() -> String {
        use rand::Rng;

        const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        const SECRET_LENGTH: usize = 64;

        let mut rng = rand::rng();
        (0..SECRET_LENGTH)
            .map(|_| {
                let idx = rng.random_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error(
        "JWT secret is required when dev_mode is false. Set ROSTER__AUTH__JWT_SECRET or auth.jwt_secret in config."
    )]
    MissingJwtSecret,

    #[error("JWT secret must be at least 32 characters long.")]
    JwtSecretTooShort,

    #[error("Environment variable '{0}' not found (referenced via env:{0} in config).")]
    EnvVarNotFound(String),

    #[error("Environment variable '{0}' is empty (referenced via env:{0} in config).")]
    EnvVarEmpty(String),
}

/// Development identity selectable with `X-Dev-User: <id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DevUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}
