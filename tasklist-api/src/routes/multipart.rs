//! Multipart form support for the endpoints that accept a profile image.
//!
//! Registration and profile updates accept either a JSON body or a
//! `multipart/form-data` body whose text fields mirror the JSON one,
//! plus a single optional file part named `profileImage`. This module
//! holds the shared plumbing: content-type sniffing, form walking, and
//! the validate-name-store sequence for an accepted image.

use std::collections::HashMap;

use axum::extract::{Multipart, Request};
use axum::http::header;
use bytes::Bytes;
use tasklist_shared::upload::{self, UploadStore};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

/// The fixed multipart field name for image uploads.
pub const PROFILE_IMAGE_FIELD: &str = "profileImage";

/// A file part lifted out of a multipart body.
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Text fields plus the optional image part of a profile form.
#[derive(Debug, Default)]
pub struct ProfileForm {
    pub fields: HashMap<String, String>,
    pub image: Option<UploadedFile>,
}

impl ProfileForm {
    /// Takes a text field out of the form.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

/// True when the request body is `multipart/form-data`.
pub fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Walks a multipart body into a [`ProfileForm`].
///
/// Browsers send an empty file part when no file was chosen; those are
/// treated as "no image".
pub async fn parse_profile_form(multipart: &mut Multipart) -> ApiResult<ProfileForm> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == PROFILE_IMAGE_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read file: {}", e)))?;

            if filename.is_empty() && bytes.is_empty() {
                continue;
            }

            form.image = Some(UploadedFile {
                filename,
                content_type,
                bytes,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::Validation(format!("Failed to read field: {}", e)))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Validates an uploaded image and writes it to the store, returning the
/// stored key.
///
/// `owner` is None during registration, when the user id does not exist
/// yet; the generated filename then carries a `temp` prefix.
pub async fn store_profile_image(
    store: &UploadStore,
    owner: Option<Uuid>,
    file: &UploadedFile,
) -> ApiResult<String> {
    upload::validate_image_type(file.content_type.as_deref(), &file.filename)?;

    let filename = upload::generate_filename(owner, &file.filename);
    let key = store.store_profile_image(&filename, &file.bytes).await?;

    Ok(key)
}
