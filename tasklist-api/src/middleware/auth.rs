//! Bearer-token authentication middleware.
//!
//! Protected route groups are wrapped with [`require_auth`], which
//! validates the `Authorization: Bearer <token>` header and resolves the
//! token's subject to a live user row. The full [`CurrentUser`] lands in
//! request extensions, so handlers never re-fetch the caller.
//!
//! Resolving against the database on every request means a deleted
//! account invalidates its outstanding tokens immediately, even though
//! the tokens themselves carry their own expiry.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tasklist_shared::{auth::jwt, models::user::User};

use crate::{app::AppState, error::ApiError};

/// The authenticated caller, inserted into request extensions by
/// [`require_auth`] and extracted by handlers via `Extension`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Middleware gate for protected routes.
///
/// Rejects with 401 before any handler work when the token is missing,
/// malformed, expired, or refers to a user that no longer exists.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Auth("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Auth("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Auth("User no longer exists".to_string()))?;

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
