//! Image upload validation and storage.
//!
//! Uploads are accepted when either the declared MIME type or the
//! lower-cased file extension is on the image allow-list; rejection
//! reports both so a client can see exactly what was refused. Size is
//! capped at 5 MB with an error distinct from type rejection.
//!
//! Stored files live under the upload root in a per-purpose directory
//! (currently only `profiles/`), named
//! `<owner-id|temp>-<millis>-<random>.<ext>` so concurrent uploads never
//! collide. Deletion is best-effort: a failed unlink is logged and
//! swallowed, because file cleanup must never fail the operation that
//! triggered it.

use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::warn;
use uuid::Uuid;

/// Maximum accepted upload size in bytes (5 MB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Subdirectory of the upload root holding profile images.
pub const PROFILE_DIR: &str = "profiles";

const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
];

const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tiff"];

/// Error type for upload handling
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// No file was present in the request
    #[error("Please select an image file")]
    MissingFile,

    /// File exceeded the size cap
    #[error("File too large. Maximum size is 5MB")]
    TooLarge { size: usize },

    /// Neither MIME type nor extension is an allowed image type
    #[error(
        "Invalid file type. Received MIME type: {mime}, extension: {extension}. \
         Only image files are allowed"
    )]
    InvalidType { mime: String, extension: String },

    /// Path key escaped the upload root
    #[error("Invalid stored file path")]
    InvalidPath,

    /// Filesystem failure while storing
    #[error("Failed to store file: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts the lower-cased extension (with leading dot) from a
/// filename. Empty string when there is none.
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Validates that an upload is an image, accepting it when the MIME type
/// *or* the extension matches the allow-list.
pub fn validate_image_type(mime: Option<&str>, filename: &str) -> Result<(), UploadError> {
    let mime = mime.unwrap_or("");
    let extension = file_extension(filename);

    let mime_ok = ALLOWED_MIME_TYPES.contains(&mime);
    let extension_ok = ALLOWED_EXTENSIONS.contains(&extension.as_str());

    if mime_ok || extension_ok {
        Ok(())
    } else {
        Err(UploadError::InvalidType {
            mime: if mime.is_empty() {
                "unknown".to_string()
            } else {
                mime.to_string()
            },
            extension: if extension.is_empty() {
                "none".to_string()
            } else {
                extension
            },
        })
    }
}

/// Enforces the size cap.
pub fn validate_image_size(size: usize) -> Result<(), UploadError> {
    if size > MAX_IMAGE_BYTES {
        return Err(UploadError::TooLarge { size });
    }
    Ok(())
}

/// Generates a collision-resistant stored filename:
/// owner id (or `temp` during registration), millisecond timestamp, a
/// random suffix, and the lower-cased original extension.
pub fn generate_filename(owner: Option<Uuid>, original: &str) -> String {
    let owner = owner
        .map(|id| id.to_string())
        .unwrap_or_else(|| "temp".to_string());
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);

    format!(
        "{}-{}-{}{}",
        owner,
        chrono::Utc::now().timestamp_millis(),
        suffix,
        file_extension(original),
    )
}

/// Filesystem store rooted at the configured upload directory.
///
/// Stored keys are root-relative paths like `profiles/<filename>`; the
/// same keys are persisted on the user row and served back under
/// `/uploads/`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The upload root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the upload root and its per-purpose subdirectories.
    /// Called once at startup.
    pub async fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        tokio::fs::create_dir_all(self.root.join(PROFILE_DIR)).await
    }

    /// Validates and writes a profile image, returning its stored key.
    pub async fn store_profile_image(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, UploadError> {
        validate_image_size(bytes.len())?;

        let key = format!("{}/{}", PROFILE_DIR, filename);
        let path = self.resolve(&key)?;
        tokio::fs::write(&path, bytes).await?;

        Ok(key)
    }

    /// Best-effort removal of a stored file. Failures are logged and
    /// swallowed; cleanup never fails the caller's operation.
    pub async fn remove(&self, key: &str) {
        let path = match self.resolve(key) {
            Ok(path) => path,
            Err(_) => {
                warn!(key, "Refusing to delete stored file outside upload root");
                return;
            }
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(key, error = %e, "Failed to delete stored file");
        }
    }

    /// Maps a stored key to an absolute path, rejecting traversal.
    fn resolve(&self, key: &str) -> Result<PathBuf, UploadError> {
        let relative = Path::new(key);
        let escapes = relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir));
        if escapes {
            return Err(UploadError::InvalidPath);
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> UploadStore {
        let root = std::env::temp_dir().join(format!("tasklist-upload-{}", Uuid::new_v4()));
        UploadStore::new(root)
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("photo.PNG"), ".png");
        assert_eq!(file_extension("archive.tar.gz"), ".gz");
        assert_eq!(file_extension("no-extension"), "");
    }

    #[test]
    fn test_validate_image_type_by_mime() {
        // MIME alone is enough even with a bogus extension.
        assert!(validate_image_type(Some("image/png"), "upload.bin").is_ok());
    }

    #[test]
    fn test_validate_image_type_by_extension() {
        // Extension alone is enough even with a generic MIME type.
        assert!(validate_image_type(Some("application/octet-stream"), "photo.JPEG").is_ok());
        assert!(validate_image_type(None, "photo.webp").is_ok());
    }

    #[test]
    fn test_validate_image_type_rejects_both_unknown() {
        let err = validate_image_type(Some("application/pdf"), "report.pdf").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("application/pdf"));
        assert!(message.contains(".pdf"));
    }

    #[test]
    fn test_validate_image_size() {
        assert!(validate_image_size(MAX_IMAGE_BYTES).is_ok());

        let err = validate_image_size(MAX_IMAGE_BYTES + 1).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));
        assert!(err.to_string().contains("5MB"));
    }

    #[test]
    fn test_generate_filename_shape() {
        let owner = Uuid::new_v4();
        let name = generate_filename(Some(owner), "Selfie.JPG");

        assert!(name.starts_with(&owner.to_string()));
        assert!(name.ends_with(".jpg"));

        let anonymous = generate_filename(None, "pic.png");
        assert!(anonymous.starts_with("temp-"));
    }

    #[test]
    fn test_generate_filename_is_collision_resistant() {
        let owner = Uuid::new_v4();
        let a = generate_filename(Some(owner), "x.png");
        let b = generate_filename(Some(owner), "x.png");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_store_and_remove_profile_image() {
        let store = temp_store();
        store.ensure_dirs().await.unwrap();

        let key = store
            .store_profile_image("user-123.png", b"not really a png")
            .await
            .unwrap();
        assert_eq!(key, "profiles/user-123.png");

        let on_disk = store.root().join(&key);
        assert!(tokio::fs::metadata(&on_disk).await.is_ok());

        store.remove(&key).await;
        assert!(tokio::fs::metadata(&on_disk).await.is_err());

        tokio::fs::remove_dir_all(store.root()).await.ok();
    }

    #[tokio::test]
    async fn test_store_rejects_oversized_payload() {
        let store = temp_store();
        store.ensure_dirs().await.unwrap();

        let oversized = vec![0u8; MAX_IMAGE_BYTES + 1];
        let result = store.store_profile_image("big.png", &oversized).await;
        assert!(matches!(result, Err(UploadError::TooLarge { .. })));

        tokio::fs::remove_dir_all(store.root()).await.ok();
    }

    #[tokio::test]
    async fn test_remove_refuses_traversal() {
        let store = temp_store();
        store.ensure_dirs().await.unwrap();

        // Must not panic or touch anything outside the root.
        store.remove("../etc/passwd").await;

        tokio::fs::remove_dir_all(store.root()).await.ok();
    }
}
