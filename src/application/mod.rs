//! Application layer with the album workflow.

/// Application services.
pub mod services;

pub use services::AlbumService;
