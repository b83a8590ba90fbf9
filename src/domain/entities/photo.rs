//! Photo metadata, stored photo records and cache keys.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PinId;
use crate::domain::errors::ValidationError;

/// Key of an entry in the local photo cache: a bare file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Reserved key used when metadata is too incomplete to name a file.
    pub const PLACEHOLDER: &'static str = "placeholder.png";

    /// Creates a key, rejecting anything that is not a plain file name.
    ///
    /// # Errors
    /// Returns error if the key is empty, a dot entry, or contains a path separator.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty()
            || value == "."
            || value == ".."
            || value.contains('/')
            || value.contains('\\')
            || value.contains('\0')
        {
            return Err(ValidationError::InvalidCacheKey(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_string())
    }

    /// Derives the key from the last segment of a remote photo path,
    /// falling back to the placeholder key.
    #[must_use]
    pub fn from_remote_path(path: &str) -> Self {
        path.rsplit('/')
            .next()
            .and_then(|segment| Self::new(segment).ok())
            .unwrap_or_else(Self::placeholder)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0 == Self::PLACEHOLDER
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One photo as described by the search API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: String,
    pub secret: String,
    pub server: String,
    pub title: String,
}

impl PhotoMetadata {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        server: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            server: server.into(),
            title: title.into(),
        }
    }

    /// Returns true when id, secret and server are all present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty() && !self.secret.is_empty() && !self.server.is_empty()
    }

    /// Path of the photo relative to the static image host,
    /// in `<server>/<id>_<secret>.jpg` form.
    #[must_use]
    pub fn remote_path(&self) -> Option<String> {
        self.is_complete()
            .then(|| format!("{}/{}_{}.jpg", self.server, self.id, self.secret))
    }

    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        self.remote_path()
            .map_or_else(CacheKey::placeholder, |path| {
                CacheKey::from_remote_path(&path)
            })
    }
}

/// A page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoPage {
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub total: u64,
    pub photos: Vec<PhotoMetadata>,
}

impl PhotoPage {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhotoId(Uuid);

impl PhotoId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for PhotoId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl std::str::FromStr for PhotoId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// A persisted photo belonging to exactly one pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub id: PhotoId,
    pub pin_id: PinId,
    pub remote_id: String,
    pub server: String,
    pub secret: String,
    pub title: String,
    pub cache_key: CacheKey,
    pub created_at: DateTime<Utc>,
}

impl PhotoRecord {
    /// Creates a fresh record for `pin_id` from search metadata.
    #[must_use]
    pub fn from_metadata(pin_id: PinId, metadata: &PhotoMetadata) -> Self {
        Self {
            id: PhotoId::generate(),
            pin_id,
            remote_id: metadata.id.clone(),
            server: metadata.server.clone(),
            secret: metadata.secret.clone(),
            title: metadata.title.clone(),
            cache_key: metadata.cache_key(),
            created_at: Utc::now().trunc_subsecs(6),
        }
    }

    /// Metadata needed to download the photo again.
    #[must_use]
    pub fn metadata(&self) -> PhotoMetadata {
        PhotoMetadata::new(&self.remote_id, &self.secret, &self.server, &self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_remote_path_and_cache_key() {
        let meta = PhotoMetadata::new("5123", "abcd", "65535", "Sunset");

        assert_eq!(meta.remote_path().as_deref(), Some("65535/5123_abcd.jpg"));
        assert_eq!(meta.cache_key().as_str(), "5123_abcd.jpg");
    }

    #[test_case("", "abcd", "65535" ; "missing_id")]
    #[test_case("5123", "", "65535" ; "missing_secret")]
    #[test_case("5123", "abcd", "" ; "missing_server")]
    fn test_incomplete_metadata_uses_placeholder(id: &str, secret: &str, server: &str) {
        let meta = PhotoMetadata::new(id, secret, server, "");

        assert!(meta.remote_path().is_none());
        assert!(meta.cache_key().is_placeholder());
    }

    #[test_case("" ; "empty")]
    #[test_case(".." ; "parent_dir")]
    #[test_case("a/b.jpg" ; "slash")]
    #[test_case("a\\b.jpg" ; "backslash")]
    fn test_cache_key_rejects_paths(value: &str) {
        assert!(CacheKey::new(value).is_err());
    }

    #[test]
    fn test_cache_key_from_remote_path_trailing_slash() {
        assert!(CacheKey::from_remote_path("65535/").is_placeholder());
    }

    #[test]
    fn test_record_keeps_metadata() {
        let pin_id = PinId::generate();
        let meta = PhotoMetadata::new("1", "s", "2", "title");
        let record = PhotoRecord::from_metadata(pin_id, &meta);

        assert_eq!(record.pin_id, pin_id);
        assert_eq!(record.metadata(), meta);
        assert_eq!(record.cache_key.as_str(), "1_s.jpg");
    }
}
