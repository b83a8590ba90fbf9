//! Photo album workflow for a single pin.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tracing::{debug, error, info, warn};

use crate::domain::entities::{AlbumEvent, AlbumState, Pin, PinId, PhotoRecord};
use crate::domain::errors::AlbumError;
use crate::domain::ports::{MergePolicy, PhotoCachePort, PhotoSourcePort, PinStorePort};

const EVENT_CAPACITY: usize = 64;

/// Default number of photo downloads in flight per album.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DownloadOutcome {
    Downloaded,
    AlreadyCached,
    Placeholder,
    Failed,
}

/// Counts of a batch of photo downloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub already_cached: usize,
    /// Records with incomplete metadata that show the placeholder image.
    pub placeholders: usize,
    pub failed: usize,
}

impl DownloadStats {
    fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded => self.downloaded += 1,
            DownloadOutcome::AlreadyCached => self.already_cached += 1,
            DownloadOutcome::Placeholder => self.placeholders += 1,
            DownloadOutcome::Failed => self.failed += 1,
        }
    }
}

/// Drives the album lifecycle of pins.
///
/// Operations on the same pin run one at a time; different pins proceed
/// concurrently. Every transition is published to subscribers after the
/// store writes it reveals have completed.
pub struct AlbumService {
    store: Arc<dyn PinStorePort>,
    source: Arc<dyn PhotoSourcePort>,
    cache: Arc<dyn PhotoCachePort>,
    max_concurrent_downloads: usize,
    locks: Mutex<HashMap<PinId, Arc<AsyncMutex<()>>>>,
    states: Mutex<HashMap<PinId, AlbumState>>,
    events: broadcast::Sender<AlbumEvent>,
}

impl AlbumService {
    #[must_use]
    pub fn new(
        store: Arc<dyn PinStorePort>,
        source: Arc<dyn PhotoSourcePort>,
        cache: Arc<dyn PhotoCachePort>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            source,
            cache,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            locks: Mutex::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
            events,
        }
    }

    /// Sets how many photo downloads may run at once (at least one).
    #[must_use]
    pub fn with_max_concurrent_downloads(mut self, limit: usize) -> Self {
        self.max_concurrent_downloads = limit.max(1);
        self
    }

    /// Current state of the pin's album.
    #[must_use]
    pub fn state(&self, pin_id: PinId) -> AlbumState {
        self.states.lock().get(&pin_id).cloned().unwrap_or_default()
    }

    /// Subscribes to album state transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<AlbumEvent> {
        self.events.subscribe()
    }

    /// Shows the pin's album, searching for photos only when none are stored.
    ///
    /// A failed search ends in [`AlbumState::Failed`] and is not an error.
    ///
    /// # Errors
    /// Returns error if the store cannot be read or written.
    pub async fn load_album(&self, pin: &Pin) -> Result<AlbumState, AlbumError> {
        let lock = self.pin_lock(pin.id());
        let _guard = lock.lock().await;

        let stored = self.store.photos_for(pin).await?;
        if !stored.is_empty() {
            debug!(pin_id = %pin.id(), count = stored.len(), "Album served from store");
            let state = AlbumState::Populated(stored);
            self.transition(pin.id(), state.clone());
            return Ok(state);
        }

        self.transition(pin.id(), AlbumState::Loading);
        self.settle(pin, self.search_and_store(pin, 1).await)
    }

    /// Drops the pin's photos and replaces them with a random page of results.
    ///
    /// # Errors
    /// Returns error if the old photos cannot be removed, in which case no
    /// search is made, or if the store cannot be written.
    pub async fn refresh_album(&self, pin: &Pin) -> Result<AlbumState, AlbumError> {
        let lock = self.pin_lock(pin.id());
        let _guard = lock.lock().await;

        self.transition(pin.id(), AlbumState::Refreshing);

        let removed = match self.store.delete_all_photos(pin).await {
            Ok(count) => count,
            Err(e) => return self.settle(pin, Err(e.into())),
        };
        let pages = match self.store.page_count(pin).await {
            Ok(pages) => pages,
            Err(e) => return self.settle(pin, Err(e.into())),
        };

        debug!(pin_id = %pin.id(), removed, pages, "Cleared album for refresh");

        self.transition(pin.id(), AlbumState::Loading);
        self.settle(pin, self.search_and_store(pin, pages).await)
    }

    /// Removes one photo from the pin's album.
    ///
    /// # Errors
    /// Returns error if the photo belongs to another pin or cannot be removed.
    pub async fn delete_photo(&self, pin: &Pin, record: &PhotoRecord) -> Result<(), AlbumError> {
        if record.pin_id != pin.id() {
            return Err(AlbumError::PhotoNotOwned {
                photo: record.id,
                pin: pin.id(),
            });
        }

        let lock = self.pin_lock(pin.id());
        let _guard = lock.lock().await;

        self.store.delete_photo(record).await?;

        if let Some(AlbumState::Populated(photos)) = self.states.lock().get_mut(&pin.id()) {
            photos.retain(|p| p.id != record.id);
        }

        info!(pin_id = %pin.id(), photo_id = %record.id, "Removed photo from album");
        Ok(())
    }

    /// Deletes the pin together with its photos and cached files.
    ///
    /// Waits for an in-flight load or refresh of the pin to finish, so no
    /// download lands in the cache after the pin's records are gone.
    ///
    /// # Errors
    /// Returns error if the pin does not exist or cannot be removed.
    pub async fn delete_pin(&self, pin: &Pin) -> Result<(), AlbumError> {
        let lock = self.pin_lock(pin.id());
        let _guard = lock.lock().await;

        self.store.delete_pin(pin).await?;
        self.states.lock().remove(&pin.id());

        info!(pin_id = %pin.id(), "Deleted pin and its album");
        Ok(())
    }

    fn pin_lock(&self, pin_id: PinId) -> Arc<AsyncMutex<()>> {
        Arc::clone(self.locks.lock().entry(pin_id).or_default())
    }

    fn transition(&self, pin_id: PinId, state: AlbumState) {
        debug!(pin_id = %pin_id, state = state.label(), "Album state changed");
        self.states.lock().insert(pin_id, state.clone());
        let _ = self.events.send(AlbumEvent { pin_id, state });
    }

    /// Publishes the final state of an operation.
    fn settle(
        &self,
        pin: &Pin,
        outcome: Result<AlbumState, AlbumError>,
    ) -> Result<AlbumState, AlbumError> {
        match outcome {
            Ok(state) => {
                self.transition(pin.id(), state.clone());
                Ok(state)
            }
            Err(e) => {
                error!(pin_id = %pin.id(), error = %e, "Album operation failed");
                self.transition(
                    pin.id(),
                    AlbumState::Failed {
                        reason: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn search_and_store(&self, pin: &Pin, page_count: u32) -> Result<AlbumState, AlbumError> {
        let page = match self.source.fetch_page(pin.coordinate(), page_count).await {
            Ok(page) => page,
            Err(e) => {
                warn!(pin_id = %pin.id(), error = %e, "Photo search failed");
                return Ok(AlbumState::Failed {
                    reason: e.to_string(),
                });
            }
        };

        if page.is_empty() {
            info!(pin_id = %pin.id(), "No photos found near pin");
            return Ok(AlbumState::Empty);
        }

        let records = page
            .photos
            .iter()
            .map(|metadata| PhotoRecord::from_metadata(pin.id(), metadata))
            .collect();
        let saved = self
            .store
            .save_photo_records(pin, records, MergePolicy::ObjectTrumps)
            .await?;

        if saved.is_empty() {
            warn!(pin_id = %pin.id(), found = page.photos.len(), "No photo record could be saved");
            return Ok(AlbumState::Failed {
                reason: "no photo record could be saved".to_string(),
            });
        }

        self.store.set_page_count(pin, page.pages).await?;

        let stats = self.download_all(&saved).await;
        info!(
            pin_id = %pin.id(),
            page = page.page,
            pages = page.pages,
            saved = saved.len(),
            downloaded = stats.downloaded,
            already_cached = stats.already_cached,
            placeholders = stats.placeholders,
            failed = stats.failed,
            "Album loaded"
        );

        let stored = self.store.photos_for(pin).await?;
        if stored.is_empty() {
            warn!(pin_id = %pin.id(), "Photo records disappeared while loading");
            return Ok(AlbumState::Failed {
                reason: "photo records were removed while loading".to_string(),
            });
        }
        Ok(AlbumState::Populated(stored))
    }

    async fn download_all(&self, records: &[PhotoRecord]) -> DownloadStats {
        stream::iter(records)
            .map(|record| self.download(record))
            .buffer_unordered(self.max_concurrent_downloads)
            .fold(DownloadStats::default(), |mut stats, outcome| async move {
                stats.record(outcome);
                stats
            })
            .await
    }

    async fn download(&self, record: &PhotoRecord) -> DownloadOutcome {
        let metadata = record.metadata();
        if record.cache_key.is_placeholder() || !metadata.is_complete() {
            return DownloadOutcome::Placeholder;
        }
        if self.cache.contains(&record.cache_key).await {
            return DownloadOutcome::AlreadyCached;
        }

        let bytes = match self.source.fetch_photo_bytes(&metadata).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(remote_id = %record.remote_id, error = %e, "Failed to download photo, skipping");
                return DownloadOutcome::Failed;
            }
        };

        match self.cache.store(&record.cache_key, &bytes).await {
            Ok(()) => DownloadOutcome::Downloaded,
            Err(e) => {
                warn!(key = %record.cache_key, error = %e, "Failed to cache photo, skipping");
                DownloadOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CacheKey, Coordinate, PhotoMetadata};
    use crate::domain::errors::{FetchError, StorageError};
    use crate::domain::ports::mocks::{MockPhotoCache, MockPhotoSource, MockPinStore};
    use crate::infrastructure::cache::DiskPhotoCache;
    use crate::infrastructure::persistence::SqlitePinStore;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        service: AlbumService,
        store: Arc<SqlitePinStore>,
        cache: Arc<DiskPhotoCache>,
        source: Arc<MockPhotoSource>,
        _temp: TempDir,
    }

    async fn harness() -> Harness {
        let temp = TempDir::new().unwrap();
        let cache = Arc::new(DiskPhotoCache::new(temp.path().join("photos")).await.unwrap());
        let store = Arc::new(SqlitePinStore::open_in_memory(cache.clone()).unwrap());
        let source = Arc::new(MockPhotoSource::new());
        let service = AlbumService::new(store.clone(), source.clone(), cache.clone());

        Harness {
            service,
            store,
            cache,
            source,
            _temp: temp,
        }
    }

    fn photo(id: &str) -> PhotoMetadata {
        PhotoMetadata::new(id, format!("sec{id}"), "65535", format!("title {id}"))
    }

    fn photos(ids: &[&str]) -> Vec<PhotoMetadata> {
        ids.iter().map(|id| photo(id)).collect()
    }

    fn coordinate() -> Coordinate {
        Coordinate::new(10.0, 20.0).unwrap()
    }

    #[tokio::test]
    async fn test_load_populates_store_and_cache() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2", "3"]), 5);

        let state = h.service.load_album(&pin).await.unwrap();

        assert_eq!(state.photos().len(), 3);
        assert_eq!(h.service.state(pin.id()), state);
        assert_eq!(h.store.photos_for(&pin).await.unwrap().len(), 3);
        for id in ["1", "2", "3"] {
            let key = CacheKey::new(format!("{id}_sec{id}.jpg")).unwrap();
            assert!(h.cache.contains(&key).await, "missing cache entry {key}");
        }
        assert_eq!(h.source.searches(), vec![(coordinate(), 1)]);
        assert_eq!(h.store.page_count(&pin).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_second_load_uses_store() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1"]), 1);

        h.service.load_album(&pin).await.unwrap();
        let state = h.service.load_album(&pin).await.unwrap();

        assert_eq!(state.photos().len(), 1);
        assert_eq!(h.source.searches().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_search_is_empty_state() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(Vec::new(), 0);

        let state = h.service.load_album(&pin).await.unwrap();

        assert_eq!(state, AlbumState::Empty);
        assert!(h.store.photos_for(&pin).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_leaves_store_untouched() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_error(FetchError::Timeout);

        let state = h.service.load_album(&pin).await.unwrap();

        assert!(matches!(state, AlbumState::Failed { .. }));
        assert!(h.store.photos_for(&pin).await.unwrap().is_empty());
        assert!(h.cache.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_replaces_old_photos() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2", "3"]), 7);
        h.source.push_photos(photos(&["8", "9"]), 7);

        let first = h.service.load_album(&pin).await.unwrap();
        let state = h.service.refresh_album(&pin).await.unwrap();

        let remote_ids: Vec<_> = state.photos().iter().map(|r| r.remote_id.as_str()).collect();
        assert_eq!(remote_ids.len(), 2);
        assert!(remote_ids.contains(&"8") && remote_ids.contains(&"9"));
        for old in first.photos() {
            assert!(!h.cache.contains(&old.cache_key).await);
        }
        assert_eq!(h.source.searches()[1], (coordinate(), 7));
    }

    #[tokio::test]
    async fn test_refresh_aborts_when_delete_fails() {
        let store = Arc::new(MockPinStore::new());
        let source = Arc::new(MockPhotoSource::new());
        let service = AlbumService::new(
            store.clone(),
            source.clone(),
            Arc::new(MockPhotoCache::new()),
        );
        let pin = store.create_pin(coordinate()).await.unwrap();
        source.push_photos(photos(&["1"]), 1);
        service.load_album(&pin).await.unwrap();

        store.set_fail_deletes(true);
        let err = service.refresh_album(&pin).await.unwrap_err();

        assert!(matches!(err, AlbumError::Storage(StorageError::Database(_))));
        assert!(matches!(service.state(pin.id()), AlbumState::Failed { .. }));
        assert_eq!(source.searches().len(), 1);
        assert_eq!(store.photos_for(&pin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_download_failures_are_skipped() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2", "3"]), 1);
        h.source.fail_download_for("2");

        let state = h.service.load_album(&pin).await.unwrap();

        assert_eq!(state.photos().len(), 3);
        assert_eq!(h.cache.len(), 2);
    }

    #[tokio::test]
    async fn test_incomplete_metadata_uses_placeholder() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source
            .push_photos(vec![photo("1"), PhotoMetadata::new("2", "", "", "no server")], 1);

        let state = h.service.load_album(&pin).await.unwrap();

        assert_eq!(state.photos().len(), 2);
        assert!(state.photos().iter().any(|r| r.cache_key.is_placeholder()));
        assert!(!h.cache.contains(&CacheKey::placeholder()).await);
        assert_eq!(h.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_saved_is_failure() {
        let store = Arc::new(MockPinStore::new());
        let source = Arc::new(MockPhotoSource::new());
        let service = AlbumService::new(
            store.clone(),
            source.clone(),
            Arc::new(MockPhotoCache::new()),
        );
        let pin = store.create_pin(coordinate()).await.unwrap();
        source.push_photos(photos(&["1"]), 1);
        store.fail_save_for("1");

        let state = service.load_album(&pin).await.unwrap();

        assert!(matches!(state, AlbumState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_nothing_saved_keeps_page_count() {
        let store = Arc::new(MockPinStore::new());
        let source = Arc::new(MockPhotoSource::new());
        let service = AlbumService::new(
            store.clone(),
            source.clone(),
            Arc::new(MockPhotoCache::new()),
        );
        let pin = store.create_pin(coordinate()).await.unwrap();
        store.set_page_count(&pin, 3).await.unwrap();
        source.push_photos(photos(&["1", "2"]), 40);
        store.fail_save_for("1");
        store.fail_save_for("2");

        let state = service.load_album(&pin).await.unwrap();

        assert!(matches!(state, AlbumState::Failed { .. }));
        assert_eq!(store.page_count(&pin).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_cache_store_failure_is_skipped() {
        let store = Arc::new(MockPinStore::new());
        let source = Arc::new(MockPhotoSource::new());
        let cache = Arc::new(MockPhotoCache::new());
        let service = AlbumService::new(store.clone(), source.clone(), cache.clone());
        let pin = store.create_pin(coordinate()).await.unwrap();
        source.push_photos(photos(&["1", "2", "3"]), 1);
        let broken = CacheKey::new("2_sec2.jpg").unwrap();
        cache.fail_store_for(broken.clone());

        let state = service.load_album(&pin).await.unwrap();

        assert!(matches!(state, AlbumState::Populated(_)));
        assert_eq!(state.photos().len(), 3);
        let keys = cache.keys();
        assert_eq!(keys.len(), 2);
        assert!(!keys.contains(&broken));
    }

    #[tokio::test]
    async fn test_refresh_search_failure_drops_old_photos() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2", "3"]), 2);
        h.source.push_error(FetchError::Timeout);

        h.service.load_album(&pin).await.unwrap();
        let state = h.service.refresh_album(&pin).await.unwrap();

        assert!(matches!(state, AlbumState::Failed { .. }));
        assert_eq!(h.service.state(pin.id()), state);
        assert!(h.store.photos_for(&pin).await.unwrap().is_empty());
        assert!(h.cache.is_empty());
    }

    #[tokio::test]
    async fn test_delete_pin_waits_for_load() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2", "3"]), 1);
        h.source.set_download_delay(Duration::from_millis(200));

        let (loaded, deleted) = tokio::join!(h.service.load_album(&pin), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            h.service.delete_pin(&pin).await
        });

        assert_eq!(loaded.unwrap().photos().len(), 3);
        deleted.unwrap();
        assert!(h.store.find_pin(pin.id()).await.unwrap().is_none());
        assert!(h.store.photos_for(&pin).await.unwrap().is_empty());
        assert_eq!(h.cache.len(), 0);
        assert_eq!(h.service.state(pin.id()), AlbumState::Idle);
    }

    #[tokio::test]
    async fn test_records_removed_during_load_is_failure() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2"]), 1);
        h.source.set_download_delay(Duration::from_millis(200));

        let (loaded, cleared) = tokio::join!(h.service.load_album(&pin), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            h.store.delete_all_photos(&pin).await
        });

        assert_eq!(cleared.unwrap(), 2);
        assert!(matches!(loaded.unwrap(), AlbumState::Failed { .. }));
    }

    #[tokio::test]
    async fn test_delete_unknown_pin() {
        let h = harness().await;
        let pin = Pin::new(coordinate());

        let err = h.service.delete_pin(&pin).await.unwrap_err();

        assert!(matches!(err, AlbumError::Storage(StorageError::PinNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_photo_keeps_state_variant() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2"]), 1);
        let state = h.service.load_album(&pin).await.unwrap();
        let victim = state.photos()[0].clone();

        h.service.delete_photo(&pin, &victim).await.unwrap();

        let after = h.service.state(pin.id());
        assert_eq!(after.photos().len(), 1);
        assert!(!h.cache.contains(&victim.cache_key).await);
        assert_eq!(h.store.photos_for(&pin).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_photo_of_other_pin() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        let other = h.store.create_pin(Coordinate::new(0.0, 0.0).unwrap()).await.unwrap();
        let record = PhotoRecord::from_metadata(other.id(), &photo("1"));

        let err = h.service.delete_photo(&pin, &record).await.unwrap_err();

        assert!(matches!(err, AlbumError::PhotoNotOwned { .. }));
    }

    #[tokio::test]
    async fn test_delete_pin_after_load_leaves_no_files() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2", "3"]), 1);
        let state = h.service.load_album(&pin).await.unwrap();

        h.service.delete_pin(&pin).await.unwrap();

        assert!(h.store.photos_for(&pin).await.unwrap().is_empty());
        for record in state.photos() {
            assert!(!h.cache.path_for(&record.cache_key).exists());
        }
    }

    #[tokio::test]
    async fn test_concurrent_loads_search_once() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        h.source.push_photos(photos(&["1", "2"]), 1);

        let (a, b) = tokio::join!(h.service.load_album(&pin), h.service.load_album(&pin));

        assert_eq!(a.unwrap().photos().len(), 2);
        assert_eq!(b.unwrap().photos().len(), 2);
        assert_eq!(h.source.searches().len(), 1);
    }

    #[tokio::test]
    async fn test_transitions_are_published() {
        let h = harness().await;
        let pin = h.store.create_pin(coordinate()).await.unwrap();
        let mut events = h.service.subscribe();
        h.source.push_photos(Vec::new(), 0);

        h.service.load_album(&pin).await.unwrap();

        assert_eq!(events.recv().await.unwrap().state, AlbumState::Loading);
        assert_eq!(events.recv().await.unwrap().state, AlbumState::Empty);
    }

    #[test]
    fn test_download_stats_tally() {
        let mut stats = DownloadStats::default();
        for outcome in [
            DownloadOutcome::Downloaded,
            DownloadOutcome::Downloaded,
            DownloadOutcome::Placeholder,
            DownloadOutcome::Failed,
        ] {
            stats.record(outcome);
        }

        assert_eq!(
            stats,
            DownloadStats {
                downloaded: 2,
                already_cached: 0,
                placeholders: 1,
                failed: 1,
            }
        );
    }
}
