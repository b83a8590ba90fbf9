//! Plain-text rendering of pins, albums and regions.

use crate::domain::entities::{AlbumState, MapRegion, PhotoRecord, Pin};

#[must_use]
pub fn pin_line(pin: &Pin) -> String {
    format!(
        "{}  {}  {}",
        pin.id(),
        pin.coordinate(),
        pin.created_at().format("%Y-%m-%d %H:%M:%S")
    )
}

#[must_use]
pub fn photo_line(record: &PhotoRecord, cached: bool) -> String {
    let title = if record.title.trim().is_empty() {
        "(untitled)"
    } else {
        record.title.as_str()
    };
    let marker = if record.cache_key.is_placeholder() {
        "placeholder"
    } else if cached {
        "cached"
    } else {
        "missing"
    };

    format!("{}  {:<11}  {}", record.id, marker, title)
}

/// One-line summary of an album state.
#[must_use]
pub fn album_summary(state: &AlbumState) -> String {
    match state {
        AlbumState::Populated(photos) if photos.len() == 1 => "1 photo".to_string(),
        AlbumState::Populated(photos) => format!("{} photos", photos.len()),
        AlbumState::Empty => "No photos found near this pin".to_string(),
        AlbumState::Failed { reason } => format!("Could not load photos: {reason}"),
        other => other.label().to_string(),
    }
}

#[must_use]
pub fn region_line(region: &MapRegion) -> String {
    format!(
        "center ({:.6}, {:.6})  span {:.6} x {:.6}",
        region.latitude, region.longitude, region.latitude_delta, region.longitude_delta
    )
}
