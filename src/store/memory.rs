use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;

use super::ImageStore;
use crate::error::StoreError;

/// In-process image store.
///
/// Contents are lost on restart, so this is only suitable for local
/// development and tests.
#[derive(Default)]
pub struct MemoryImageStore {
    images: RwLock<HashMap<String, Bytes>>,
}

impl MemoryImageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored images.
    pub async fn len(&self) -> usize {
        self.images.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.images.read().await.is_empty()
    }

    /// Whether an image is stored under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.images.read().await.contains_key(key)
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.images.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.images.write().await.insert(key.to_string(), data);
        Ok(())
    }
}
