//! Media storage port - where uploaded post images live.

use async_trait::async_trait;

/// Storage for uploaded files, addressed by media-relative paths.
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Store `bytes` as a new post image and return its media-relative path.
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, MediaError>;

    /// Read a stored file. `Ok(None)` when nothing is stored at `path`.
    async fn open(&self, path: &str) -> Result<Option<Vec<u8>>, MediaError>;

    /// Remove a stored file; missing files are not an error.
    async fn remove(&self, path: &str) -> Result<(), MediaError>;
}

/// Media storage errors.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid media path: {0}")]
    InvalidPath(String),

    #[error("Storage I/O failed: {0}")]
    Io(String),
}
