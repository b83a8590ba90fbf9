//! Local photo byte cache.

pub mod disk_cache;

pub use disk_cache::{DiskPhotoCache, default_cache_dir};
