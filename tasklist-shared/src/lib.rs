//! # Tasklist Shared Library
//!
//! This crate contains the types, persistence operations, and utilities
//! shared by the tasklist API server.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing and JWT tokens
//! - `db`: Connection pool and migrations
//! - `upload`: Image upload validation and storage

pub mod auth;
pub mod db;
pub mod models;
pub mod upload;

/// Current version of the tasklist shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
