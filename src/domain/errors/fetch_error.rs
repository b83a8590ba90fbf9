//! Photo search and download error types.

use thiserror::Error;

/// Errors returned by a photo source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("photo service returned HTTP {status}")]
    Status { status: u16 },

    #[error("photo service error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("photo metadata is incomplete: {id}")]
    IncompleteMetadata { id: String },
}

impl FetchError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns whether the failure happened in transport rather than in the payload.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::Timeout | Self::Status { .. }
        )
    }
}

