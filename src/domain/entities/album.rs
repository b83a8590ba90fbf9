//! Album lifecycle state.

use super::{PhotoRecord, PinId};

/// Lifecycle of a single pin's album.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlbumState {
    /// Nothing requested yet in this session.
    #[default]
    Idle,
    /// Searching for photos and downloading them.
    Loading,
    /// Dropping the current photos before a new search.
    Refreshing,
    /// Photos are stored, newest first.
    Populated(Vec<PhotoRecord>),
    /// The search returned no photos.
    Empty,
    Failed { reason: String },
}

impl AlbumState {
    #[must_use]
    pub fn photos(&self) -> &[PhotoRecord] {
        match self {
            Self::Populated(photos) => photos,
            _ => &[],
        }
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Refreshing => "refreshing",
            Self::Populated(_) => "populated",
            Self::Empty => "empty",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for AlbumState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Populated(photos) => write!(f, "populated ({} photos)", photos.len()),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            other => f.write_str(other.label()),
        }
    }
}

/// Emitted on every album state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumEvent {
    pub pin_id: PinId,
    pub state: AlbumState,
}
