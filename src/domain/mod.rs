//! Domain layer with core entities, errors, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;

pub use entities::{
    AlbumEvent, AlbumState, CacheKey, Coordinate, MapRegion, PhotoId, PhotoMetadata, PhotoPage,
    PhotoRecord, Pin, PinId,
};
pub use errors::{AlbumError, FetchError, StorageError, ValidationError};
pub use ports::{
    CacheError, CacheResult, MergePolicy, PhotoCachePort, PhotoSourcePort, PinStorePort,
    StoreEvent,
};
