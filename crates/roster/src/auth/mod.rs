//! Authentication module.
//!
//! Provides JWT validation middleware with support for:
//! - HS256 bearer tokens or an `auth_token` cookie
//! - Dev bypass mode with configurable test users

mod claims;
mod config;
mod error;
mod middleware;

pub use claims::Claims;
pub use config::{AuthConfig, ConfigValidationError, DevUser};
pub use error::AuthError;
pub use middleware::{AuthState, CurrentUser, auth_middleware};
