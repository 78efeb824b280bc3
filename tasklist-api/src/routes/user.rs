//! Account management endpoints.
//!
//! - `GET /api/user/profile` / `PUT /api/user/profile`
//! - `PUT /api/user/profile-image`
//! - `PUT /api/user/change-password`
//! - `GET /api/user/stats`
//! - `DELETE /api/user/account`

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tasklist_shared::{
    auth::password,
    models::{
        todo::{Todo, TodoStats},
        user::{UpdateProfile, User, UserProfile},
    },
};
use tracing::warn;
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    middleware::auth::CurrentUser,
    response::ApiResponse,
    routes::{
        auth::UpdateProfileRequest,
        multipart::{self, UploadedFile},
        validation_message,
    },
};

/// Change-password request. Fields are optional so that missing input
/// yields the service's own message rather than a deserialization error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

/// Account deletion request: the password re-confirmation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeleteAccountRequest {
    pub password: Option<String>,
}

/// Profile image update payload: the profile plus a directly servable URL.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileImageData {
    #[serde(flatten)]
    pub user: UserProfile,
    pub profile_image_url: String,
}

/// Per-user statistics payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsData {
    pub user: AccountSummary,
    pub todo_stats: TodoStatsData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub username: String,
    pub email: String,
    pub member_since: DateTime<Utc>,
    pub days_since_registration: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoStatsData {
    #[serde(flatten)]
    pub stats: TodoStats,
    pub completion_rate: i64,
}

/// `GET /api/user/profile`
pub async fn get_profile(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<UserProfile>> {
    ApiResponse::data(UserProfile::from(user))
}

/// `PUT /api/user/profile`: field-only profile update.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    AppJson(body): AppJson<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    body.validate().map_err(validation_message)?;

    let user = apply_profile_update(
        &state,
        &current,
        UpdateProfile {
            username: body.username,
            email: body.email,
        },
    )
    .await?;

    Ok(ApiResponse::data_with_message(
        user.into(),
        "Profile updated successfully",
    ))
}

/// `PUT /api/user/profile-image`: multipart, file required.
pub async fn update_profile_image(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    mut mp: axum::extract::Multipart,
) -> ApiResult<Json<ApiResponse<ProfileImageData>>> {
    let form = multipart::parse_profile_form(&mut mp).await?;
    let file = form
        .image
        .ok_or_else(|| ApiError::Validation("Please select an image file".to_string()))?;

    let user = replace_profile_image(&state, &current, &file).await?;
    let profile_image_url = format!("/uploads/{}", user.profile_image);

    Ok(ApiResponse::data_with_message(
        ProfileImageData {
            user: user.into(),
            profile_image_url,
        },
        "Profile image updated successfully",
    ))
}

/// `PUT /api/user/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(body): AppJson<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let (current_password, new_password, confirm_password) =
        match (body.current_password, body.new_password, body.confirm_password) {
            (Some(c), Some(n), Some(r)) => (c, n, r),
            _ => {
                return Err(ApiError::Validation(
                    "Please provide current password, new password, and confirm password"
                        .to_string(),
                ))
            }
        };

    if new_password != confirm_password {
        return Err(ApiError::Validation(
            "New password and confirm password do not match".to_string(),
        ));
    }

    password::validate_password_length(&new_password).map_err(ApiError::Validation)?;

    if !password::verify_password(&current_password, &user.password_hash)? {
        return Err(ApiError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(&new_password)?;
    User::update_password(&state.db, user.id, &password_hash).await?;

    Ok(ApiResponse::message("Password changed successfully"))
}

/// `DELETE /api/user/account`
///
/// Cleanup runs in order: stored image, owned todos, then the user row.
/// The first two are best effort; their failures are logged and the
/// deletion still completes. The FK cascade removes any todos a failed
/// explicit delete left behind.
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(body): AppJson<DeleteAccountRequest>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let password = body.password.ok_or_else(|| {
        ApiError::Validation("Please provide your password to confirm account deletion".to_string())
    })?;

    if !password::verify_password(&password, &user.password_hash)? {
        return Err(ApiError::BadRequest("Incorrect password".to_string()));
    }

    if user.has_custom_image() {
        state.uploads.remove(&user.profile_image).await;
    }

    if let Err(e) = Todo::delete_all_for_user(&state.db, user.id).await {
        warn!(user_id = %user.id, error = %e, "Failed to delete todos during account deletion");
    }

    User::delete(&state.db, user.id).await?;

    Ok(ApiResponse::message("Account deleted successfully"))
}

/// `GET /api/user/stats`
pub async fn user_stats(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Json<ApiResponse<UserStatsData>>> {
    let stats = Todo::stats_for_user(&state.db, user.id).await?;
    let days_since_registration = (Utc::now() - user.created_at).num_days();

    Ok(ApiResponse::data(UserStatsData {
        user: AccountSummary {
            username: user.username,
            email: user.email,
            member_since: user.created_at,
            days_since_registration,
        },
        todo_stats: TodoStatsData {
            completion_rate: stats.completion_rate(),
            stats,
        },
    }))
}

/// Applies a username/email update for `current`, with conflict checks
/// that exclude the user's own row. No-op updates return the current row
/// unchanged.
pub(crate) async fn apply_profile_update(
    state: &AppState,
    current: &User,
    update: UpdateProfile,
) -> ApiResult<User> {
    if update.username.is_none() && update.email.is_none() {
        return Ok(current.clone());
    }

    if let Some(username) = &update.username {
        if username != &current.username
            && User::username_exists(&state.db, username, Some(current.id)).await?
        {
            return Err(ApiError::Conflict("Username already exists".to_string()));
        }
    }

    if let Some(email) = &update.email {
        if email != &current.email
            && User::email_exists(&state.db, email, Some(current.id)).await?
        {
            return Err(ApiError::Conflict("Email already exists".to_string()));
        }
    }

    User::update_profile(&state.db, current.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Stores a new profile image for `user` and persists its key.
///
/// If persistence fails after the file hit disk, the new file is removed
/// so no orphan remains. The previous image is deleted (best effort)
/// only once the new key is safely on the row, and never when it is the
/// default sentinel.
pub(crate) async fn replace_profile_image(
    state: &AppState,
    user: &User,
    file: &UploadedFile,
) -> ApiResult<User> {
    let new_key = multipart::store_profile_image(&state.uploads, Some(user.id), file).await?;

    let updated = match User::update_profile_image(&state.db, user.id, &new_key).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            state.uploads.remove(&new_key).await;
            return Err(ApiError::NotFound("User not found".to_string()));
        }
        Err(e) => {
            state.uploads.remove(&new_key).await;
            return Err(e.into());
        }
    };

    if user.has_custom_image() {
        state.uploads.remove(&user.profile_image).await;
    }

    Ok(updated)
}
