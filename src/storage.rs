use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Content types accepted by local uploads.
pub const ALLOWED_CONTENT_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// Public URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads/";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File too large (max {} MB)", .max_bytes / 1024 / 1024)]
    TooLarge { max_bytes: usize },

    #[error("File type not allowed: {0}")]
    UnsupportedType(String),

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully buffered upload, already checked against the size ceiling.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// FileStorage
///
/// Abstract contract for where uploaded files land. Handlers only see the public URL
/// that comes back from `save`, never a filesystem path.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Per-file size ceiling in bytes. Handlers use it to stop reading a multipart
    /// field as soon as it is exceeded, before anything is written.
    fn max_file_size(&self) -> usize;

    /// Stores the file and returns its public URL (`/uploads/<name>`).
    async fn save(&self, file: UploadedFile) -> Result<String, StorageError>;

    /// Removes a file previously returned by `save`.
    async fn delete(&self, url: &str) -> Result<(), StorageError>;
}

/// StorageState
///
/// The shared handle stored in `AppState`.
pub type StorageState = Arc<dyn FileStorage>;

/// Rejects anything outside the image allow-list.
pub fn check_content_type(content_type: &str) -> Result<(), StorageError> {
    if ALLOWED_CONTENT_TYPES.contains(&content_type) {
        Ok(())
    } else {
        Err(StorageError::UnsupportedType(content_type.to_string()))
    }
}

/// Keeps the original extension only when it is short and alphanumeric, lowercased.
fn sanitized_extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Random, collision-free name for a stored file.
pub fn generate_file_name(original: &str) -> String {
    match sanitized_extension(original) {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

/// LocalDiskStorage
///
/// Writes uploads into a single flat directory that the router serves under `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    max_file_size: usize,
}

impl LocalDiskStorage {
    /// Creates the upload directory if it does not exist yet.
    pub async fn new(root: impl Into<PathBuf>, max_file_size: usize) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            max_file_size,
        })
    }

    /// Maps a public URL back to a path inside `root`. Only the final path component is
    /// kept, so `../` segments cannot escape the upload directory.
    fn path_for(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(PUBLIC_PREFIX).unwrap_or(url);
        let name = Path::new(name).file_name()?;
        Some(self.root.join(name))
    }
}

#[async_trait]
impl FileStorage for LocalDiskStorage {
    fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    async fn save(&self, file: UploadedFile) -> Result<String, StorageError> {
        if file.bytes.len() > self.max_file_size {
            return Err(StorageError::TooLarge {
                max_bytes: self.max_file_size,
            });
        }
        check_content_type(&file.content_type)?;

        let name = generate_file_name(&file.file_name);
        tokio::fs::write(self.root.join(&name), &file.bytes).await?;

        tracing::debug!(file = %name, bytes = file.bytes.len(), "stored upload");
        Ok(format!("{PUBLIC_PREFIX}{name}"))
    }

    async fn delete(&self, url: &str) -> Result<(), StorageError> {
        let Some(path) = self.path_for(url) else {
            return Ok(());
        };
        tokio::fs::remove_file(path).await?;
        Ok(())
    }
}
