//! User model and database operations.
//!
//! Passwords are stored as Argon2id hashes, never in plaintext, and the
//! hash is excluded from every serialized projection. Username and email
//! are unique; the UNIQUE constraints in the schema are the source of
//! truth, and the `*_exists` helpers here are only a fast path that lets
//! handlers produce a friendly conflict message before attempting the
//! write.
//!
//! # Example
//!
//! ```no_run
//! use tasklist_shared::models::user::{CreateUser, User};
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! let user = User::create(
//!     &pool,
//!     CreateUser {
//!         username: "ada".to_string(),
//!         email: "ada@example.com".to_string(),
//!         password_hash: "$argon2id$...".to_string(),
//!         profile_image: None,
//!     },
//! )
//! .await?;
//! println!("Created user: {}", user.id);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Sentinel profile image value meaning "no user-uploaded image".
///
/// Files with this name are never created or deleted by the upload
/// handling code.
pub const DEFAULT_PROFILE_IMAGE: &str = "default-profile.png";

const USER_COLUMNS: &str =
    "id, username, email, password_hash, profile_image, created_at, updated_at";

/// User account row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Relative path of the profile image under the upload root, or
    /// [`DEFAULT_PROFILE_IMAGE`]
    pub profile_image: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user, safe to serialize in responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile_image: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            profile_image: user.profile_image,
            created_at: user.created_at,
        }
    }
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    /// Argon2id hash, not a plaintext password
    pub password_hash: String,
    /// Stored image key, or None for the default sentinel
    pub profile_image: Option<String>,
}

/// Input for updating profile fields. Only non-None fields are written.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfile {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl User {
    /// True when the user has uploaded a custom profile image.
    pub fn has_custom_image(&self) -> bool {
        self.profile_image != DEFAULT_PROFILE_IMAGE
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// A username or email collision surfaces as a database unique
    /// constraint violation; callers map that to a conflict.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (username, email, password_hash, profile_image)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.username)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(
                data.profile_image
                    .unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string()),
            )
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by username or email: the login lookup.
    pub async fn find_by_username_or_email(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(identifier)
            .fetch_optional(pool)
            .await
    }

    /// Checks whether a username is taken, optionally excluding one user
    /// (so a profile update does not collide with itself).
    pub async fn username_exists(
        pool: &PgPool,
        username: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM users
                WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2)
            )",
        )
        .bind(username)
        .bind(exclude)
        .fetch_one(pool)
        .await
    }

    /// Checks whether an email is taken, optionally excluding one user.
    pub async fn email_exists(
        pool: &PgPool,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM users
                WHERE email = $1 AND ($2::uuid IS NULL OR id <> $2)
            )",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(pool)
        .await
    }

    /// Updates username and/or email. Only supplied fields change; the
    /// `updated_at` timestamp always advances.
    ///
    /// Returns the updated user, or None if the user no longer exists.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProfile,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.username.is_some() {
            bind_count += 1;
            query.push_str(&format!(", username = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(username) = data.username {
            q = q.bind(username);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }

        q.fetch_optional(pool).await
    }

    /// Replaces the stored password hash.
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replaces the stored profile image key.
    pub async fn update_profile_image(
        pool: &PgPool,
        id: Uuid,
        profile_image: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET profile_image = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(profile_image)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a user account.
    ///
    /// Owned todos are removed by the schema's FK cascade; callers that
    /// want ordered cleanup delete them explicitly first.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_custom_image() {
        let mut user = sample_user();
        assert!(!user.has_custom_image());

        user.profile_image = "profiles/abc-123.png".to_string();
        assert!(user.has_custom_image());
    }

    #[test]
    fn test_profile_never_contains_password_hash() {
        let user = sample_user();
        let profile: UserProfile = user.into();

        let json = serde_json::to_value(&profile).unwrap();
        let rendered = json.to_string();
        assert!(!rendered.contains("password"));
        assert!(!rendered.contains("argon2id"));
        assert_eq!(json["username"], "ada");
        assert_eq!(json["profileImage"], DEFAULT_PROFILE_IMAGE);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_update_profile_default_is_empty() {
        let update = UpdateProfile::default();
        assert!(update.username.is_none());
        assert!(update.email.is_none());
    }

    // Database-backed tests for the CRUD operations require a running
    // PostgreSQL instance and are exercised through the API layer.
}
