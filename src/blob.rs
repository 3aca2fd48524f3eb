use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult, FieldErrors};

/// Where uploaded images end up. Returns the public URL of the stored object.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, bytes: Bytes, key: &str) -> AppResult<String>;
}

/// Blob store backed by a directory served under `public_prefix`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, bytes: Bytes, key: &str) -> AppResult<String> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(AppError::InvalidRequest(format!("bad object key {:?}", key)));
        }

        let file_path = self.root.join(relative);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("create {}: {}", parent.display(), e)))?;
        }
        fs::write(&file_path, &bytes)
            .await
            .map_err(|e| AppError::Internal(format!("write {}: {}", file_path.display(), e)))?;

        tracing::info!("Stored {} bytes at {}", bytes.len(), file_path.display());
        Ok(format!("{}/{}", self.public_prefix, key))
    }
}

/// A file part pulled out of a multipart body.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
}

impl ImageUpload {
    fn is_image(&self) -> bool {
        let declared = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image/"));
        let guessed = self
            .file_name
            .as_deref()
            .and_then(|name| mime_guess::from_path(name).first())
            .is_some_and(|mime| mime.type_() == mime_guess::mime::IMAGE);
        declared || guessed
    }

    /// Size cap and `image/*` gate, reported as field errors.
    pub fn validate(&self, max_bytes: usize) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if self.bytes.len() > max_bytes {
            errors.add("To_large", "Sorry, Please upload an Image of 500KB or less");
        }
        if !self.is_image() {
            errors.add("Not_Image", "Please Upload a valid image");
        }
        errors.into_result()
    }

    /// `folder/<uuid v7>.<ext>`, keeping the client's extension if it had one.
    pub fn object_key(&self, folder: &str) -> String {
        let extension = self
            .file_name
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        format!("{}/{}{}", folder, Uuid::now_v7(), extension)
    }
}
