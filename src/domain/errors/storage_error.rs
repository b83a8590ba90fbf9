//! Pin store error types.

use thiserror::Error;

use crate::domain::entities::{PhotoId, PinId};

/// Persistence failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("pin not found: {0}")]
    PinNotFound(PinId),

    #[error("photo not found: {0}")]
    PhotoNotFound(PhotoId),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Returns whether the error reports a missing entity.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::PinNotFound(_) | Self::PhotoNotFound(_))
    }
}
