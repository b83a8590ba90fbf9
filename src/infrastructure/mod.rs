//! Infrastructure layer with external service adapters.

/// Photo byte cache on disk.
pub mod cache;
/// Application configuration.
pub mod config;
/// Flickr photo search client.
pub mod flickr;
/// SQLite pin store.
pub mod persistence;

pub use cache::DiskPhotoCache;
pub use config::{AppConfig, CliArgs, LogLevel, StateConfig, StorageManager};
pub use flickr::FlickrPhotoSource;
pub use persistence::SqlitePinStore;
