//! Domain entity definitions.

mod album;
mod coordinate;
mod photo;
mod pin;
mod region;

pub use album::{AlbumEvent, AlbumState};
pub use coordinate::Coordinate;
pub use photo::{CacheKey, PhotoId, PhotoMetadata, PhotoPage, PhotoRecord};
pub use pin::{Pin, PinId};
pub use region::MapRegion;
