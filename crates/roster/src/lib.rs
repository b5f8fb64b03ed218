//! Roster library.
//!
//! User management over HTTP: validation, authorization policy, SQLite
//! persistence and the axum router that ties them together.

pub mod api;
pub mod auth;
pub mod db;
pub mod user;
