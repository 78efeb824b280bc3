//! Database models.
//!
//! Each model owns its CRUD operations against the pool:
//!
//! - `user`: accounts, credentials, profile image reference
//! - `todo`: user-owned tasks with status, priority, and statistics
//!
//! Every todo operation is scoped by its owning user; a todo is never
//! visible or mutable through another user's id.

pub mod todo;
pub mod user;
