//! API route handlers organized by resource:
//!
//! - `health`: service-level endpoints (welcome, liveness, 404 fallback)
//! - `auth`: registration, login, current-user profile
//! - `todos`: todo CRUD, status transitions, statistics
//! - `user`: account management, image upload, password, deletion

pub mod auth;
pub mod health;
pub mod multipart;
pub mod todos;
pub mod user;

use crate::error::ApiError;

/// Flattens `validator` errors into one envelope message.
pub(crate) fn validation_message(errors: validator::ValidationErrors) -> ApiError {
    let messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(_, field_errors)| {
            field_errors.iter().map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string())
            })
        })
        .collect();

    ApiError::Validation(messages.join("; "))
}
