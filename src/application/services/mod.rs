pub mod album_service;

pub use album_service::{AlbumService, DEFAULT_MAX_CONCURRENT_DOWNLOADS, DownloadStats};
