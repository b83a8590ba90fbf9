//! Application configuration.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::args::CliArgs;
use crate::infrastructure::cache::default_cache_dir;
use crate::infrastructure::flickr::endpoints::{
    DEFAULT_PER_PAGE, DEFAULT_RADIUS_KM, FLICKR_REST_BASE, FLICKR_STATIC_BASE,
};

const DATABASE_FILE_NAME: &str = "pins.db";
const LOG_FILE_NAME: &str = "virtual-tourist.log";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Directory holding the pin database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding downloaded photos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Photo search service.
    #[serde(default)]
    pub flickr: FlickrConfig,

    /// Album loading.
    #[serde(default)]
    pub album: AlbumConfig,
}

/// Flickr search configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct FlickrConfig {
    /// API key. Usually supplied through `FLICKR_API_KEY`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// REST endpoint used for searches.
    #[serde(default = "default_search_url")]
    pub search_url: String,

    /// Base URL photo files are downloaded from.
    #[serde(default = "default_static_url")]
    pub static_url: String,

    /// Results per search page.
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Search radius around a pin, in kilometers.
    #[serde(default = "default_radius_km")]
    pub radius_km: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FlickrConfig {
    /// Returns true if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl std::fmt::Debug for FlickrConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlickrConfig")
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "<unset>" })
            .field("search_url", &self.search_url)
            .field("static_url", &self.static_url)
            .field("per_page", &self.per_page)
            .field("radius_km", &self.radius_km)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for FlickrConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            search_url: default_search_url(),
            static_url: default_static_url(),
            per_page: default_per_page(),
            radius_km: default_radius_km(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Album loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumConfig {
    /// Photo downloads running at the same time.
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,
}

impl Default for AlbumConfig {
    fn default() -> Self {
        Self {
            max_concurrent_downloads: default_max_concurrent_downloads(),
        }
    }
}

fn default_search_url() -> String {
    FLICKR_REST_BASE.to_string()
}

fn default_static_url() -> String {
    FLICKR_STATIC_BASE.to_string()
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_radius_km() -> u32 {
    DEFAULT_RADIUS_KM
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_downloads() -> usize {
    4
}

impl AppConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(data_dir) = &args.data_dir {
            self.data_dir = Some(data_dir.clone());
        }
        if let Some(cache_dir) = &args.cache_dir {
            self.cache_dir = Some(cache_dir.clone());
        }
        if let Some(api_key) = &args.api_key {
            self.flickr.api_key.clone_from(api_key);
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from(crate::APP_QUALIFIER, crate::APP_ORGANIZATION, crate::NAME)
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default data directory.
    #[must_use]
    pub fn default_data_dir() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        Self::default_data_dir().map(|dir| dir.join(LOG_FILE_NAME))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }

    /// Returns the pin database path.
    #[must_use]
    pub fn effective_database_path(&self) -> Option<PathBuf> {
        self.data_dir
            .clone()
            .or_else(Self::default_data_dir)
            .map(|dir| dir.join(DATABASE_FILE_NAME))
    }

    /// Returns the photo cache directory.
    #[must_use]
    pub fn effective_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            data_dir: None,
            cache_dir: None,
            flickr: FlickrConfig::default(),
            album: AlbumConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_config_with_sections() {
        let toml_content = r#"
            log_level = "debug"
            data_dir = "/tmp/vt"

            [flickr]
            per_page = 50

            [album]
            max_concurrent_downloads = 8
        "#;

        let config: AppConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(
            config.effective_database_path(),
            Some(PathBuf::from("/tmp/vt/pins.db"))
        );
        assert_eq!(config.flickr.per_page, 50);
        assert_eq!(config.flickr.radius_km, DEFAULT_RADIUS_KM);
        assert_eq!(config.flickr.search_url, FLICKR_REST_BASE);
        assert!(!config.flickr.has_api_key());
        assert_eq!(config.album.max_concurrent_downloads, 8);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.flickr.per_page, DEFAULT_PER_PAGE);
        assert_eq!(config.album.max_concurrent_downloads, 4);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_default_config_round_trips() {
        let content = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&content).unwrap();

        assert_eq!(parsed.flickr.static_url, FLICKR_STATIC_BASE);
        assert!(!content.contains("api_key"));
    }

    #[test]
    fn test_args_override_file() {
        let mut config = AppConfig::default();
        let args = CliArgs::parse_from([
            "virtual-tourist",
            "--log-level",
            "trace",
            "--cache-dir",
            "/tmp/photos",
            "--api-key",
            "abc",
            "pin",
            "list",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.effective_cache_dir(), PathBuf::from("/tmp/photos"));
        assert_eq!(config.flickr.api_key, "abc");
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = FlickrConfig {
            api_key: "secret-key".to_string(),
            ..FlickrConfig::default()
        };

        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
