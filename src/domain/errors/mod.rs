//! Domain error types.

mod album_error;
mod fetch_error;
mod storage_error;
mod validation_error;

pub use album_error::AlbumError;
pub use fetch_error::FetchError;
pub use storage_error::StorageError;
pub use validation_error::ValidationError;
