//! Application state shared across handlers.

use crate::auth::AuthState;
use crate::user::UserService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// User persistence.
    pub users: UserService,
    /// Authentication state.
    pub auth: AuthState,
}

impl AppState {
    /// Create new application state.
    pub fn new(users: UserService, auth: AuthState) -> Self {
        Self { users, auth }
    }
}
