//! Port definition for the local photo byte cache.

use bytes::Bytes;

use crate::domain::entities::CacheKey;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    /// Photo not present in cache.
    #[error("photo not cached: {0}")]
    NotFound(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for storing raw photo bytes by key.
/// Implementations must be thread-safe.
#[async_trait::async_trait]
pub trait PhotoCachePort: Send + Sync {
    /// Writes bytes under `key`, replacing any previous entry.
    async fn store(&self, key: &CacheKey, bytes: &[u8]) -> CacheResult<()>;

    /// Reads the bytes stored under `key`.
    async fn read(&self, key: &CacheKey) -> CacheResult<Bytes>;

    /// Removes the entry. Removing a missing entry succeeds.
    async fn delete(&self, key: &CacheKey) -> CacheResult<()>;

    /// Checks whether `key` is cached.
    async fn contains(&self, key: &CacheKey) -> bool;

    /// Returns the current number of cached photos.
    fn len(&self) -> usize;

    /// Returns true if the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
