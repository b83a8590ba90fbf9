//! Disk-backed photo cache: one file per photo, named by its cache key.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use bytes::Bytes;
use tokio::fs;
use tracing::{debug, trace, warn};

use crate::domain::entities::CacheKey;
use crate::domain::ports::{CacheError, CacheResult, PhotoCachePort};

/// Prefix of in-progress writes; never a valid photo file.
const PARTIAL_PREFIX: &str = ".partial-";

/// Disk cache persisting raw photo bytes.
pub struct DiskPhotoCache {
    cache_dir: PathBuf,
    current_size: AtomicU64,
    item_count: AtomicUsize,
}

impl DiskPhotoCache {
    /// Opens (creating if needed) a cache rooted at `cache_dir`.
    ///
    /// # Errors
    /// Returns error if the cache directory cannot be created or read.
    pub async fn new(cache_dir: PathBuf) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to create cache dir: {e}")))?;
        let mut total_size = 0u64;
        let mut count = 0usize;

        let mut entries = fs::read_dir(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("Failed to read cache dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.file_name().to_string_lossy().starts_with(PARTIAL_PREFIX) {
                if let Err(e) = fs::remove_file(entry.path()).await {
                    warn!(path = %entry.path().display(), error = %e, "Failed to remove partial cache file");
                }
                continue;
            }
            if let Ok(meta) = entry.metadata().await
                && meta.is_file()
            {
                total_size += meta.len();
                count += 1;
            }
        }

        debug!(dir = %cache_dir.display(), count, total_size, "Opened photo cache");

        Ok(Self {
            cache_dir,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
        })
    }

    /// Returns the directory holding the cached files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the file path for a key.
    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.as_str())
    }

    /// Returns the current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl PhotoCachePort for DiskPhotoCache {
    async fn store(&self, key: &CacheKey, bytes: &[u8]) -> CacheResult<()> {
        let path = self.path_for(key);

        let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();

        // Written beside the target, then renamed into place.
        let dir = self.cache_dir.clone();
        let target = path.clone();
        let data = bytes.to_vec();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut temp = tempfile::Builder::new()
                .prefix(PARTIAL_PREFIX)
                .tempfile_in(&dir)?;
            temp.write_all(&data)?;
            temp.flush()?;
            temp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::IoError(format!("Cache write task failed: {e}")))?
        .map_err(|e| CacheError::IoError(format!("Failed to write cache file: {e}")))?;

        let new_size = bytes.len() as u64;
        if let Some(old) = old_size {
            if new_size > old {
                self.current_size
                    .fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.current_size
                    .fetch_sub(old - new_size, Ordering::Relaxed);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(key = %key, path = %path.display(), size = bytes.len(), "Stored photo in cache");

        Ok(())
    }

    async fn read(&self, key: &CacheKey) -> CacheResult<Bytes> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(key = %key, "Photo cache hit");
                Ok(Bytes::from(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!(key = %key, "Photo cache miss");
                Err(CacheError::NotFound(key.to_string()))
            }
            Err(e) => Err(CacheError::IoError(format!(
                "Failed to read cache file: {e}"
            ))),
        }
    }

    async fn delete(&self, key: &CacheKey) -> CacheResult<()> {
        let path = self.path_for(key);
        let size = fs::metadata(&path).await.map(|m| m.len()).ok();
        match fs::remove_file(&path).await {
            Ok(()) => {
                if let Some(s) = size {
                    self.current_size.fetch_sub(s, Ordering::Relaxed);
                    self.item_count.fetch_sub(1, Ordering::Relaxed);
                }
                debug!(key = %key, "Evicted photo from cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to evict photo from cache");
                Err(CacheError::IoError(format!(
                    "Failed to remove cache file: {e}"
                )))
            }
        }
    }

    async fn contains(&self, key: &CacheKey) -> bool {
        fs::try_exists(self.path_for(key)).await.unwrap_or(false)
    }

    fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }
}

/// Returns the default cache directory path.
#[must_use]
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from(
        crate::APP_QUALIFIER,
        crate::APP_ORGANIZATION,
        crate::NAME,
    )
    .map_or_else(
        || std::env::temp_dir().join(crate::NAME).join("photos"),
        |dirs| dirs.cache_dir().join("photos"),
    )
}
