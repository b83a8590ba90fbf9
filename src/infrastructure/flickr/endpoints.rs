//! Flickr endpoint construction and page selection.

use rand::Rng;

use crate::domain::entities::{Coordinate, PhotoMetadata};

/// REST endpoint for API calls.
pub const FLICKR_REST_BASE: &str = "https://www.flickr.com/services/rest/";

/// Host serving photo files.
pub const FLICKR_STATIC_BASE: &str = "https://live.staticflickr.com";

pub const SEARCH_METHOD: &str = "flickr.photos.search";

/// Photos requested per search page.
pub const DEFAULT_PER_PAGE: u32 = 25;

pub const DEFAULT_RADIUS_KM: u32 = 1;

/// Flickr only serves the first 4000 results of a search.
pub const MAX_SEARCH_RESULTS: u32 = 4000;

/// Query parameters of a photo search.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams<'a> {
    pub api_key: &'a str,
    pub coordinate: Coordinate,
    pub radius_km: u32,
    pub per_page: u32,
    pub page: u32,
}

/// Builds the search URL for one page.
#[must_use]
pub fn search_url(base: &str, params: &SearchParams<'_>) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{base}{separator}method={SEARCH_METHOD}&api_key={}&lat={}&lon={}&radius={}&radius_units=km&format=json&nojsoncallback=1&per_page={}&page={}",
        params.api_key,
        params.coordinate.latitude(),
        params.coordinate.longitude(),
        params.radius_km,
        params.per_page,
        params.page,
    )
}

/// Builds the download URL of a photo, `None` if its metadata is incomplete.
#[must_use]
pub fn photo_url(static_base: &str, photo: &PhotoMetadata) -> Option<String> {
    photo
        .remote_path()
        .map(|path| format!("{}/{path}", static_base.trim_end_matches('/')))
}

/// Highest page number Flickr will actually serve for `per_page`.
#[must_use]
pub fn max_pages(per_page: u32) -> u32 {
    (MAX_SEARCH_RESULTS / per_page.max(1)).max(1)
}

/// Picks a page uniformly in `1..=page_count`; a count of 0 means 1.
pub fn pick_page<R: Rng + ?Sized>(rng: &mut R, page_count: u32) -> u32 {
    rng.random_range(1..=page_count.max(1))
}
