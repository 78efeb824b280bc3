//! Error handling.
//!
//! A single [`ApiError`] type covers every way a request can fail, and
//! its `IntoResponse` impl maps each class to an HTTP status plus the
//! `{success: false, message, error?}` envelope. Handlers return
//! `Result<_, ApiError>`, so no error escapes the envelope; the router
//! fallback covers unmatched routes the same way.
//!
//! Internal failures are logged in full but answered with a generic
//! message; the underlying detail is included in the `error` field only
//! in debug builds.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tasklist_shared::{
    auth::{jwt::JwtError, password::PasswordError},
    upload::UploadError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or missing input (400)
    #[error("{0}")]
    Validation(String),

    /// Request is well-formed but unacceptable, e.g. a failed password
    /// re-confirmation (400)
    #[error("{0}")]
    BadRequest(String),

    /// Bad credentials or missing/invalid/expired token (401)
    #[error("{0}")]
    Auth(String),

    /// Missing resource: including resources owned by someone else (404)
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness violation (409)
    #[error("{0}")]
    Conflict(String),

    /// Upload type/size rejection (400)
    #[error(transparent)]
    Upload(UploadError),

    /// Anything unexpected (500)
    #[error("{0}")]
    Internal(String),
}

/// Error envelope body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upload(UploadError::Io(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let (message, detail) = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);

            // Full detail stays in the logs; the body carries it only in
            // debug builds.
            let detail = if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            };
            ("Internal server error".to_string(), detail)
        } else {
            (self.to_string(), None)
        };

        let body = Json(ErrorBody {
            success: false,
            message,
            error: detail,
        });

        (status, body).into_response()
    }
}

/// Database errors: unique constraint violations become conflicts with a
/// field-specific message; everything else is internal.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.contains("username") {
                        return ApiError::Conflict("Username already exists".to_string());
                    }
                    if constraint.contains("email") {
                        return ApiError::Conflict("Email already exists".to_string());
                    }
                    return ApiError::Conflict(format!("Constraint violation: {}", constraint));
                }
                ApiError::Internal(format!("Database error: {}", db_err))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => ApiError::Auth("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Auth("Invalid token issuer".to_string()),
            JwtError::CreateError(e) => ApiError::Internal(format!("Token creation failed: {}", e)),
            JwtError::ValidationError(_) => ApiError::Auth("Invalid token".to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(format!("Password operation failed: {}", err))
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError::Upload(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Auth("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upload_error_statuses() {
        let type_rejection = ApiError::Upload(UploadError::InvalidType {
            mime: "application/pdf".into(),
            extension: ".pdf".into(),
        });
        assert_eq!(type_rejection.status(), StatusCode::BAD_REQUEST);

        let size_rejection = ApiError::Upload(UploadError::TooLarge { size: 10_000_000 });
        assert_eq!(size_rejection.status(), StatusCode::BAD_REQUEST);

        // The two rejections carry distinct messages.
        assert_ne!(type_rejection.to_string(), size_rejection.to_string());
    }

    #[test]
    fn test_jwt_error_conversion() {
        let err: ApiError = JwtError::Expired.into();
        assert!(matches!(err, ApiError::Auth(_)));
        assert_eq!(err.to_string(), "Token expired");
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
