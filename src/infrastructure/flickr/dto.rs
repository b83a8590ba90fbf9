use serde::Deserialize;

use crate::domain::entities::{PhotoMetadata, PhotoPage};
use crate::domain::errors::FetchError;
use crate::domain::serde_utils::{string_or_u32, string_or_u64};

/// Flickr `photos.search` response structure.
#[derive(Debug, Deserialize)]
pub struct SearchPhotosResponse {
    #[serde(default)]
    pub photos: Option<PhotosDto>,
    /// `"ok"` or `"fail"`.
    #[serde(default)]
    pub stat: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PhotosDto {
    #[serde(default, with = "string_or_u32")]
    pub page: u32,
    #[serde(default, with = "string_or_u32")]
    pub pages: u32,
    #[serde(default, with = "string_or_u32")]
    pub perpage: u32,
    #[serde(default, with = "string_or_u64")]
    pub total: u64,
    #[serde(default)]
    pub photo: Option<Vec<PhotoDto>>,
}

#[derive(Debug, Deserialize)]
pub struct PhotoDto {
    pub id: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub title: String,
}

impl From<PhotoDto> for PhotoMetadata {
    fn from(dto: PhotoDto) -> Self {
        Self::new(dto.id, dto.secret, dto.server, dto.title)
    }
}

impl SearchPhotosResponse {
    /// Converts the payload into a page. A missing `photos` object or an
    /// empty photo list is an empty page; `stat: "fail"` is an error.
    ///
    /// # Errors
    /// Returns error when the service reports a failure.
    pub fn into_page(self) -> Result<PhotoPage, FetchError> {
        if self.stat.as_deref() == Some("fail") {
            return Err(FetchError::Api {
                code: self.code.unwrap_or_default(),
                message: self.message.unwrap_or_default(),
            });
        }

        let Some(photos) = self.photos else {
            return Ok(PhotoPage::default());
        };

        Ok(PhotoPage {
            page: photos.page,
            pages: photos.pages,
            per_page: photos.perpage,
            total: photos.total,
            photos: photos
                .photo
                .unwrap_or_default()
                .into_iter()
                .map(PhotoMetadata::from)
                .collect(),
        })
    }
}

/// Decodes a raw search response body.
///
/// # Errors
/// Returns error if the body is not valid JSON of the expected shape, or if
/// the service reports a failure.
pub fn decode_search_response(body: &str) -> Result<PhotoPage, FetchError> {
    let response: SearchPhotosResponse =
        serde_json::from_str(body).map_err(|e| FetchError::decode(e.to_string()))?;
    response.into_page()
}
