//! Local media storage.
//!
//! Uploads land on the local filesystem under a per-bucket directory, with
//! object keys of the form `{owner_id}/{uuid}.{ext}`. The owner prefix in
//! the key is what enforces ownership on delete: a caller can only remove
//! objects filed under its own user id. Served back through a static file
//! route at `/media/{bucket}/{key}`.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use recetario_core::UserId;
use uuid::Uuid;

/// Extensions accepted for image uploads, matched case-insensitively.
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

/// Upload size cap in bytes.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Errors from media storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The file extension is missing or not in the allow-list.
    #[error("unsupported file type: {0}")]
    InvalidExtension(String),

    /// The upload exceeds the size cap.
    #[error("file is too large (limit {max_bytes} bytes)")]
    TooLarge { max_bytes: usize },

    /// The object key does not belong to the caller.
    #[error("you do not own this file")]
    NotOwner,

    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidExtension(_) | Self::TooLarge { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotOwner => StatusCode::FORBIDDEN,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Storage buckets, one directory each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    RecipeImages,
    Avatars,
}

impl Bucket {
    /// Directory name for this bucket.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RecipeImages => "recipe-images",
            Self::Avatars => "avatars",
        }
    }
}

/// Filesystem-backed media store rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Create a store rooted at `root`. Does not touch the filesystem;
    /// call [`ensure_layout`](Self::ensure_layout) at startup.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory that static file serving should point at.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the bucket directories if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if a directory cannot be created.
    pub async fn ensure_layout(&self) -> Result<(), StorageError> {
        for bucket in [Bucket::RecipeImages, Bucket::Avatars] {
            tokio::fs::create_dir_all(self.root.join(bucket.name())).await?;
        }
        Ok(())
    }

    /// Store an upload and return its object key.
    ///
    /// The key is `{owner_id}/{uuid}.{ext}`; the extension comes from the
    /// submitted filename and must be on the image allow-list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidExtension` for unsupported filenames,
    /// `StorageError::TooLarge` when the payload exceeds the cap, and
    /// `StorageError::Io` on filesystem failure.
    pub async fn store(
        &self,
        bucket: Bucket,
        owner: UserId,
        filename: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let ext = validated_extension(filename)?;
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(StorageError::TooLarge {
                max_bytes: MAX_UPLOAD_BYTES,
            });
        }

        let key = format!("{owner}/{}.{ext}", Uuid::new_v4());
        let path = self.root.join(bucket.name()).join(&key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        Ok(key)
    }

    /// Delete an object the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotOwner` when the key is not filed under the
    /// caller's user id, `StorageError::Io` on filesystem failure.
    pub async fn delete(
        &self,
        bucket: Bucket,
        owner: UserId,
        key: &str,
    ) -> Result<(), StorageError> {
        if !key_belongs_to(key, owner) {
            return Err(StorageError::NotOwner);
        }

        let path = self.root.join(bucket.name()).join(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Already gone is fine; deletes are idempotent.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    /// Public URL path for an object key.
    #[must_use]
    pub fn public_path(bucket: Bucket, key: &str) -> String {
        format!("/media/{}/{key}", bucket.name())
    }
}

/// Check that the key's leading path segment is the owner's user id.
fn key_belongs_to(key: &str, owner: UserId) -> bool {
    key.split_once('/')
        .is_some_and(|(prefix, rest)| prefix == owner.to_string() && !rest.is_empty())
}

/// Extract and validate the lowercase extension from a submitted filename.
fn validated_extension(filename: &str) -> Result<String, StorageError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| StorageError::InvalidExtension(filename.to_owned()))?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(StorageError::InvalidExtension(filename.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_extension() {
        assert_eq!(validated_extension("tarta.JPG").unwrap(), "jpg");
        assert_eq!(validated_extension("foto.webp").unwrap(), "webp");
        assert!(matches!(
            validated_extension("script.exe"),
            Err(StorageError::InvalidExtension(_))
        ));
        assert!(matches!(
            validated_extension("sin-extension"),
            Err(StorageError::InvalidExtension(_))
        ));
    }

    #[test]
    fn test_key_ownership() {
        let owner = UserId::new(42);
        assert!(key_belongs_to("42/abc.jpg", owner));
        assert!(!key_belongs_to("43/abc.jpg", owner));
        assert!(!key_belongs_to("42/", owner));
        assert!(!key_belongs_to("abc.jpg", owner));
    }

    #[tokio::test]
    async fn test_store_and_delete_roundtrip() {
        let dir = std::env::temp_dir().join(format!("recetario-media-{}", Uuid::new_v4()));
        let store = MediaStore::new(&dir);
        store.ensure_layout().await.unwrap();

        let owner = UserId::new(7);
        let key = store
            .store(Bucket::RecipeImages, owner, "tarta.png", b"not-a-real-png")
            .await
            .unwrap();
        assert!(key.starts_with("7/"));
        assert!(key.ends_with(".png"));

        let path = dir.join("recipe-images").join(&key);
        assert!(path.exists());

        // A different user cannot delete it.
        let err = store
            .delete(Bucket::RecipeImages, UserId::new(8), &key)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotOwner));

        store.delete(Bucket::RecipeImages, owner, &key).await.unwrap();
        assert!(!path.exists());

        // Deleting again is a no-op.
        store.delete(Bucket::RecipeImages, owner, &key).await.unwrap();

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_rejects_oversize() {
        let dir = std::env::temp_dir().join(format!("recetario-media-{}", Uuid::new_v4()));
        let store = MediaStore::new(&dir);
        store.ensure_layout().await.unwrap();

        let blob = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = store
            .store(Bucket::Avatars, UserId::new(1), "big.png", &blob)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { .. }));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
