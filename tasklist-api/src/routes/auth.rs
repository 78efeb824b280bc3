//! Authentication endpoints.
//!
//! - `POST /api/auth/register`: create an account (JSON or multipart
//!   with an optional profile image)
//! - `POST /api/auth/login`: exchange credentials for a token
//! - `GET /api/auth/me`: the authenticated user's public profile
//! - `PUT /api/auth/profile`: update username/email and optionally the
//!   profile image in one request

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tasklist_shared::{
    auth::password,
    models::user::{CreateUser, UpdateProfile, User, UserProfile},
};
use validator::Validate;

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::AppJson,
    middleware::auth::CurrentUser,
    response::ApiResponse,
    routes::{
        multipart::{self, ProfileForm},
        validation_message,
    },
};

/// Register request. Multipart registration builds the same struct from
/// its text fields before validation.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3 to 30 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/// Login request. The identifier matches against username or email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Token plus public user fields, returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthData {
    pub token: String,
    pub user: UserProfile,
}

/// Profile update request for `PUT /api/auth/profile`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3 to 30 characters"))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// `POST /api/auth/register`
///
/// The uniqueness fast path produces friendly conflicts, but the UNIQUE
/// constraints are authoritative: a racing duplicate insert still comes
/// back as a conflict via the database error mapping. When an image was
/// stored and the insert then fails, the file is removed again.
pub async fn register(
    State(state): State<AppState>,
    req: Request,
) -> ApiResult<impl IntoResponse> {
    let (body, image) = if multipart::is_multipart(&req) {
        let mut mp = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        let mut form = multipart::parse_profile_form(&mut mp).await?;

        let body = RegisterRequest {
            username: form.take("username").unwrap_or_default(),
            email: form.take("email").unwrap_or_default(),
            password: form.take("password").unwrap_or_default(),
        };
        (body, form.image)
    } else {
        let AppJson(body) = AppJson::<RegisterRequest>::from_request(req, &()).await?;
        (body, None)
    };

    body.validate().map_err(validation_message)?;

    if User::username_exists(&state.db, &body.username, None).await? {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    if User::email_exists(&state.db, &body.email, None).await? {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&body.password)?;

    let profile_image = match &image {
        Some(file) => Some(multipart::store_profile_image(&state.uploads, None, file).await?),
        None => None,
    };

    let created = User::create(
        &state.db,
        CreateUser {
            username: body.username,
            email: body.email,
            password_hash,
            profile_image: profile_image.clone(),
        },
    )
    .await;

    let user = match created {
        Ok(user) => user,
        Err(e) => {
            if let Some(key) = &profile_image {
                state.uploads.remove(key).await;
            }
            return Err(e.into());
        }
    };

    let token = state.issue_token(user.id)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::data_with_message(
            AuthData {
                token,
                user: user.into(),
            },
            "User registered successfully",
        ),
    ))
}

/// `POST /api/auth/login`
///
/// Unknown identifier and wrong password answer identically, so the
/// response does not reveal which part failed.
pub async fn login(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthData>>> {
    let user = User::find_by_username_or_email(&state.db, &body.username_or_email)
        .await?
        .ok_or_else(|| ApiError::Auth("Invalid credentials".to_string()))?;

    if !password::verify_password(&body.password, &user.password_hash)? {
        return Err(ApiError::Auth("Invalid credentials".to_string()));
    }

    let token = state.issue_token(user.id)?;

    Ok(ApiResponse::data(AuthData {
        token,
        user: user.into(),
    }))
}

/// `GET /api/auth/me`
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<UserProfile>> {
    ApiResponse::data(UserProfile::from(user))
}

/// `PUT /api/auth/profile`
///
/// Accepts JSON for field-only updates or multipart when the profile
/// image is replaced in the same request. Field updates are applied
/// before the image is stored, so a conflict never leaves an orphaned
/// file; the previous image is deleted only after the new one is
/// persisted on the user row.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(current)): Extension<CurrentUser>,
    req: Request,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let (body, image) = if multipart::is_multipart(&req) {
        let mut mp = Multipart::from_request(req, &())
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?;
        let mut form: ProfileForm = multipart::parse_profile_form(&mut mp).await?;

        let body = UpdateProfileRequest {
            username: form.take("username"),
            email: form.take("email"),
        };
        (body, form.image)
    } else {
        let AppJson(body) = AppJson::<UpdateProfileRequest>::from_request(req, &()).await?;
        (body, None)
    };

    body.validate().map_err(validation_message)?;

    let mut user = super::user::apply_profile_update(
        &state,
        &current,
        UpdateProfile {
            username: body.username,
            email: body.email,
        },
    )
    .await?;

    if let Some(file) = &image {
        user = super::user::replace_profile_image(&state, &user, file).await?;
    }

    Ok(ApiResponse::data_with_message(
        user.into(),
        "Profile updated successfully",
    ))
}
