//! Local-disk media storage under a configured root directory.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;

use posty_core::ports::{MediaError, MediaStorage};

use super::{POST_IMAGE_DIR, check_path, new_image_path};

/// Stores uploads as files under `root/posts/`.
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, MediaError> {
        let name = check_path(path)?;
        Ok(self.root.join(POST_IMAGE_DIR).join(name))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, MediaError> {
        let path = new_image_path(extension)?;
        let target = self.resolve(&path)?;

        tokio::fs::create_dir_all(self.root.join(POST_IMAGE_DIR))
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| MediaError::Io(e.to_string()))?;

        tracing::debug!(path = %path, size = bytes.len(), "Stored media file");
        Ok(path)
    }

    async fn open(&self, path: &str) -> Result<Option<Vec<u8>>, MediaError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }

    async fn remove(&self, path: &str) -> Result<(), MediaError> {
        let target = self.resolve(path)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_open_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path());

        let path = storage.store(b"GIF89a", "gif").await.unwrap();
        assert!(dir.path().join(&path).exists());
        assert_eq!(storage.open(&path).await.unwrap(), Some(b"GIF89a".to_vec()));

        storage.remove(&path).await.unwrap();
        assert_eq!(storage.open(&path).await.unwrap(), None);
        // removing twice is fine
        storage.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn open_refuses_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalMediaStorage::new(dir.path());
        assert!(matches!(
            storage.open("posts/../../etc/passwd").await,
            Err(MediaError::InvalidPath(_))
        ));
    }
}
