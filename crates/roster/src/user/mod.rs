//! User management module.
//!
//! Provides user persistence, update validation, and the authorization policy
//! for acting on user records.

mod error;
mod models;
pub mod policy;
mod repository;
mod service;
pub mod validation;

pub use error::{UserStoreError, UserStoreResult};
pub use models::{CreateUserRequest, DeletedUser, User, UserChanges, UserInfo, UserRole};
pub use repository::UserRepository;
pub use service::UserService;
