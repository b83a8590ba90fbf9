//! Flickr HTTP client.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};

use super::dto::decode_search_response;
use super::endpoints::{self, SearchParams};
use crate::domain::entities::{Coordinate, PhotoMetadata, PhotoPage};
use crate::domain::errors::FetchError;
use crate::domain::ports::PhotoSourcePort;
use crate::infrastructure::config::FlickrConfig;

const USER_AGENT: &str = concat!("virtual-tourist/", env!("CARGO_PKG_VERSION"));

/// Photo source backed by the Flickr REST API.
pub struct FlickrPhotoSource {
    client: Client,
    config: FlickrConfig,
}

impl std::fmt::Debug for FlickrPhotoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrPhotoSource")
            .field("search_url", &self.config.search_url)
            .field("static_url", &self.config.static_url)
            .finish_non_exhaustive()
    }
}

impl FlickrPhotoSource {
    /// Creates a client from configuration.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(config: FlickrConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchError::network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Builds the search URL for `page`.
    #[must_use]
    pub fn search_url(&self, coordinate: Coordinate, page: u32) -> String {
        endpoints::search_url(
            &self.config.search_url,
            &SearchParams {
                api_key: &self.config.api_key,
                coordinate,
                radius_km: self.config.radius_km,
                per_page: self.config.per_page,
                page,
            },
        )
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Photo service request failed");
            map_transport_error(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Photo service returned an error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

fn map_transport_error(e: &reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if e.is_connect() {
        FetchError::network("failed to connect to photo service")
    } else if e.is_decode() || e.is_body() {
        FetchError::decode(e.to_string())
    } else {
        FetchError::network(e.to_string())
    }
}

#[async_trait]
impl PhotoSourcePort for FlickrPhotoSource {
    async fn fetch_page(
        &self,
        coordinate: Coordinate,
        page_count: u32,
    ) -> Result<PhotoPage, FetchError> {
        let available = page_count.min(endpoints::max_pages(self.config.per_page));
        let page = endpoints::pick_page(&mut rand::rng(), available);
        let url = self.search_url(coordinate, page);

        debug!(%coordinate, page, page_count, "Searching photos");

        let body = self
            .get(&url)
            .await?
            .text()
            .await
            .map_err(|e| map_transport_error(&e))?;

        let result = decode_search_response(&body).inspect_err(|e| {
            warn!(error = %e, "Failed to decode search response");
        })?;

        debug!(
            page = result.page,
            pages = result.pages,
            count = result.photos.len(),
            "Search completed"
        );

        Ok(result)
    }

    async fn fetch_photo_bytes(&self, photo: &PhotoMetadata) -> Result<Bytes, FetchError> {
        let url = endpoints::photo_url(&self.config.static_url, photo).ok_or_else(|| {
            FetchError::IncompleteMetadata {
                id: photo.id.clone(),
            }
        })?;

        let bytes = self
            .get(&url)
            .await?
            .bytes()
            .await
            .map_err(|e| map_transport_error(&e))?;

        debug!(id = %photo.id, size = bytes.len(), "Downloaded photo");

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(search_url: &str) -> FlickrConfig {
        FlickrConfig {
            api_key: "KEY".to_string(),
            search_url: search_url.to_string(),
            static_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..FlickrConfig::default()
        }
    }

    #[test]
    fn test_search_url_uses_config() {
        let source = FlickrPhotoSource::new(config_with("http://localhost/rest/")).unwrap();
        let url = source.search_url(Coordinate::new(1.0, 2.0).unwrap(), 4);

        assert!(url.starts_with("http://localhost/rest/?method=flickr.photos.search"));
        assert!(url.contains("api_key=KEY"));
        assert!(url.ends_with("&per_page=25&page=4"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let source = FlickrPhotoSource::new(config_with("http://localhost/rest/")).unwrap();
        assert!(!format!("{source:?}").contains("KEY"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let source = FlickrPhotoSource::new(config_with("http://127.0.0.1:9/rest/")).unwrap();

        let err = source
            .fetch_page(Coordinate::new(1.0, 2.0).unwrap(), 1)
            .await
            .unwrap_err();

        assert!(err.is_transport(), "unexpected error: {err:?}");
    }

    #[tokio::test]
    async fn test_incomplete_metadata_is_not_requested() {
        let source = FlickrPhotoSource::new(config_with("http://127.0.0.1:9/rest/")).unwrap();
        let photo = PhotoMetadata::new("1", "", "", "t");

        let err = source.fetch_photo_bytes(&photo).await.unwrap_err();
        assert!(matches!(err, FetchError::IncompleteMetadata { .. }));
    }
}
