//! Album workflow error types.

use thiserror::Error;

use super::StorageError;
use crate::domain::entities::{PhotoId, PinId};

/// Failures that abort an album operation outright.
///
/// Search failures are not listed here: they end the operation in
/// [`AlbumState::Failed`](crate::domain::entities::AlbumState::Failed).
#[derive(Debug, Clone, Error)]
pub enum AlbumError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("photo {photo} does not belong to pin {pin}")]
    PhotoNotOwned { photo: PhotoId, pin: PinId },
}
