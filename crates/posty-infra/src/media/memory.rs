//! In-memory media storage - used by tests and when no media root is writable.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use posty_core::ports::{MediaError, MediaStorage};

use super::{check_path, new_image_path};

#[derive(Default)]
pub struct InMemoryMediaStorage {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryMediaStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MediaStorage for InMemoryMediaStorage {
    async fn store(&self, bytes: &[u8], extension: &str) -> Result<String, MediaError> {
        let path = new_image_path(extension)?;
        self.files.write().await.insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn open(&self, path: &str) -> Result<Option<Vec<u8>>, MediaError> {
        check_path(path)?;
        Ok(self.files.read().await.get(path).cloned())
    }

    async fn remove(&self, path: &str) -> Result<(), MediaError> {
        check_path(path)?;
        self.files.write().await.remove(path);
        Ok(())
    }
}
