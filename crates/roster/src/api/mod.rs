//! HTTP API module.
//!
//! REST endpoints for listing, reading, updating and deleting users.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
