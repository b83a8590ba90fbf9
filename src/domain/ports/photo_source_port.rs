//! Photo source port definition.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::entities::{Coordinate, PhotoMetadata, PhotoPage};
use crate::domain::errors::FetchError;

/// Port for searching and downloading photos near a coordinate.
#[async_trait]
pub trait PhotoSourcePort: Send + Sync {
    /// Fetches one page of photos around `coordinate`, choosing the page
    /// uniformly at random in `1..=page_count`.
    async fn fetch_page(
        &self,
        coordinate: Coordinate,
        page_count: u32,
    ) -> Result<PhotoPage, FetchError>;

    /// Downloads the image bytes of a photo.
    async fn fetch_photo_bytes(&self, photo: &PhotoMetadata) -> Result<Bytes, FetchError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashSet, VecDeque};
    use std::time::Duration;

    /// Scripted photo source for testing.
    ///
    /// Responses are served in the order they were queued; once the queue
    /// is drained every search returns an empty page.
    #[derive(Default)]
    pub struct MockPhotoSource {
        responses: Mutex<VecDeque<Result<PhotoPage, FetchError>>>,
        failing_downloads: Mutex<HashSet<String>>,
        searches: Mutex<Vec<(Coordinate, u32)>>,
        download_delay: Mutex<Option<Duration>>,
    }

    impl MockPhotoSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queues a page made of `photos`, reporting `pages` result pages.
        pub fn push_photos(&self, photos: Vec<PhotoMetadata>, pages: u32) {
            let page = PhotoPage {
                page: 1,
                pages,
                per_page: 25,
                total: photos.len() as u64,
                photos,
            };
            self.responses.lock().push_back(Ok(page));
        }

        pub fn push_error(&self, error: FetchError) {
            self.responses.lock().push_back(Err(error));
        }

        /// Makes the byte download for remote photo `id` fail.
        pub fn fail_download_for(&self, id: impl Into<String>) {
            self.failing_downloads.lock().insert(id.into());
        }

        /// Holds every byte download for `delay` before answering.
        pub fn set_download_delay(&self, delay: Duration) {
            *self.download_delay.lock() = Some(delay);
        }

        /// Page counts passed to each search so far.
        pub fn searches(&self) -> Vec<(Coordinate, u32)> {
            self.searches.lock().clone()
        }
    }

    #[async_trait]
    impl PhotoSourcePort for MockPhotoSource {
        async fn fetch_page(
            &self,
            coordinate: Coordinate,
            page_count: u32,
        ) -> Result<PhotoPage, FetchError> {
            self.searches.lock().push((coordinate, page_count));
            self.responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(PhotoPage::default()))
        }

        async fn fetch_photo_bytes(&self, photo: &PhotoMetadata) -> Result<Bytes, FetchError> {
            let delay = *self.download_delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.failing_downloads.lock().contains(&photo.id) {
                return Err(FetchError::Status { status: 404 });
            }
            Ok(Bytes::from(format!("jpeg:{}", photo.id)))
        }
    }
}
