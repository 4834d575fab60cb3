//! Post media uploads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

use crate::config::StorageConfig;
use crate::error::{ClientError, ClientResult};
use crate::ports::ObjectStore;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A stored media object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub key: String,
    pub public_url: String,
    pub content_type: String,
    pub size: u64,
}

/// Writes local files into the media bucket.
#[derive(Clone)]
pub struct MediaUploader {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    folder: String,
    max_bytes: u64,
}

impl MediaUploader {
    pub fn new(store: Arc<dyn ObjectStore>, storage: &StorageConfig) -> Self {
        Self {
            store,
            bucket: storage.bucket.clone(),
            folder: storage.folder.trim_matches('/').to_string(),
            max_bytes: storage.max_upload_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Uploads `path` under a fresh random key and returns its public URL.
    ///
    /// Files must be strictly smaller than the ceiling; the check runs
    /// locally before anything is sent.
    ///
    /// # Errors
    /// Returns `ClientError::FileTooLarge`, `ClientError::Io`, or the store's error.
    pub async fn upload(&self, path: &str) -> ClientResult<UploadedMedia> {
        let path = normalize_input_path(path);
        let io_err = |source| ClientError::Io {
            path: path.display().to_string(),
            source,
        };

        let size = tokio::fs::metadata(&path).await.map_err(io_err)?.len();
        if size >= self.max_bytes {
            return Err(ClientError::FileTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let content_type = content_type_for(&path);
        let key = self.object_key(&path);
        let file = tokio::fs::File::open(&path).await.map_err(io_err)?;

        tracing::debug!(%key, size, content_type, "uploading media");
        self.store
            .put_object(&self.bucket, &key, content_type, size, file)
            .await?;

        let public_url = self.store.public_url(&self.bucket, &key);
        tracing::info!(%key, "media uploaded");
        Ok(UploadedMedia {
            key,
            public_url,
            content_type: content_type.to_string(),
            size,
        })
    }

    fn object_key(&self, path: &Path) -> String {
        let name = match path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
        {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext.to_ascii_lowercase()),
            None => Uuid::new_v4().to_string(),
        };
        if self.folder.is_empty() {
            name
        } else {
            format!("{}/{name}", self.folder)
        }
    }
}

/// Normalizes user-provided file paths.
///
/// Handles drag-and-drop shell escaping (`\ `, `\(`, `\)`) and expands `~/`
/// to the home directory.
pub fn normalize_input_path(path: &str) -> PathBuf {
    let unescaped = path
        .trim()
        .replace("\\ ", " ")
        .replace("\\(", "(")
        .replace("\\)", ")");

    if let Some(rest) = unescaped.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(unescaped)
}

/// MIME type from the file extension, for the formats a post can carry.
pub fn mime_type_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension().and_then(|e| e.to_str())?;
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "mp4" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}

fn content_type_for(path: &Path) -> &'static str {
    if let Some(mime) = mime_type_for_extension(path) {
        return mime;
    }
    // Unknown extension: sniff magic bytes.
    match infer::get_from_path(path) {
        Ok(Some(kind)) => kind.mime_type(),
        _ => FALLBACK_MIME,
    }
}
