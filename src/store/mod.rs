//! Image cache storage.
//!
//! Rendered images are content-addressed by their cache key and written once.
//! The service never updates or evicts an entry, so a store only needs two
//! operations.
//!
//! - [`S3ImageStore`]: S3 or S3-compatible bucket (production)
//! - [`MemoryImageStore`]: in-process map (development and tests)

mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

pub use memory::MemoryImageStore;
pub use s3::{create_s3_client, S3ImageStore};

/// Trait for a key-value store of rendered images.
///
/// Implementations must tolerate concurrent access. Concurrent `put`s for the
/// same key may land in any order.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Fetch the image stored under `key`, or `None` if there is none.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Store `data` under `key`.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;
}
