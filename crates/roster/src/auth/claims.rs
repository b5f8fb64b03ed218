//! JWT claims.

use serde::{Deserialize, Serialize};

use crate::user::UserRole;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (numeric user ID, as a string).
    pub sub: String,

    /// Issuer.
    #[serde(default)]
    pub iss: Option<String>,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// Issued at (as Unix timestamp).
    #[serde(default)]
    pub iat: Option<i64>,

    /// User's email.
    #[serde(default)]
    pub email: Option<String>,

    /// User's roles.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Custom role claim (alternative to roles array).
    #[serde(default)]
    pub role: Option<String>,
}

impl Claims {
    /// Get the effective role for the user.
    pub fn effective_role(&self) -> UserRole {
        let is_admin = self
            .role
            .iter()
            .chain(self.roles.iter())
            .any(|r| r.eq_ignore_ascii_case("admin"));

        if is_admin {
            UserRole::Admin
        } else {
            UserRole::User
        }
    }

    /// The subject as a user id, if it is a positive integer.
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse::<i64>().ok().filter(|id| *id > 0)
    }
}
