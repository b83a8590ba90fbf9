//! Pin store port definition.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::entities::{Coordinate, PhotoId, PhotoRecord, Pin, PinId};
use crate::domain::errors::StorageError;

/// Conflict resolution for a photo write that collides with a stored
/// record of the same pin and remote id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// The incoming record replaces the stored one (last writer wins).
    #[default]
    ObjectTrumps,
    /// The stored record is kept and the incoming one dropped.
    StoreTrumps,
}

/// Change notification published after a write commits.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    PinCreated(Pin),
    PinDeleted(PinId),
    PhotosSaved { pin_id: PinId, count: usize },
    PhotoDeleted { pin_id: PinId, photo_id: PhotoId },
    PhotosCleared { pin_id: PinId, count: usize },
}

/// Port for pin and photo record persistence.
///
/// Deleting photo records also evicts their cached bytes.
#[async_trait]
pub trait PinStorePort: Send + Sync {
    /// Inserts a new pin stamped with the current time.
    async fn create_pin(&self, coordinate: Coordinate) -> Result<Pin, StorageError>;

    /// Returns all pins in insertion order.
    async fn list_pins(&self) -> Result<Vec<Pin>, StorageError>;

    async fn find_pin(&self, id: PinId) -> Result<Option<Pin>, StorageError>;

    /// Returns the oldest pin placed exactly at `coordinate`.
    async fn find_pin_at(&self, coordinate: Coordinate) -> Result<Option<Pin>, StorageError>;

    /// Returns the pin's photos, newest first.
    async fn photos_for(&self, pin: &Pin) -> Result<Vec<PhotoRecord>, StorageError>;

    /// Persists a batch of records for `pin`. A record that fails to save is
    /// logged and skipped; the returned list holds what is now stored.
    async fn save_photo_records(
        &self,
        pin: &Pin,
        records: Vec<PhotoRecord>,
        policy: MergePolicy,
    ) -> Result<Vec<PhotoRecord>, StorageError>;

    /// Removes one record and its cache entry.
    async fn delete_photo(&self, record: &PhotoRecord) -> Result<(), StorageError>;

    /// Removes every record of `pin` and their cache entries.
    /// Returns the number of removed records.
    async fn delete_all_photos(&self, pin: &Pin) -> Result<usize, StorageError>;

    /// Removes `pin` together with all its photos.
    async fn delete_pin(&self, pin: &Pin) -> Result<(), StorageError>;

    /// Number of result pages seen by the last search for `pin` (at least 1).
    async fn page_count(&self, pin: &Pin) -> Result<u32, StorageError>;

    async fn set_page_count(&self, pin: &Pin, pages: u32) -> Result<(), StorageError>;

    /// Subscribes to change events.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}
