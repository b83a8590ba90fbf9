mod photo_cache_port;
mod photo_source_port;
mod pin_store_port;

pub use photo_cache_port::{CacheError, CacheResult, PhotoCachePort};
pub use photo_source_port::PhotoSourcePort;
pub use pin_store_port::{MergePolicy, PinStorePort, StoreEvent};

#[cfg(test)]
pub mod mocks {
    pub use super::photo_cache_port::mock::MockPhotoCache;
    pub use super::photo_source_port::mock::MockPhotoSource;
    pub use super::pin_store_port::mock::MockPinStore;
}
