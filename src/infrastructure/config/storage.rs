use super::app_config::AppConfig;
use super::state_config::StateConfig;
use directories::ProjectDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const SETTINGS_FILE: &str = "config.toml";
const SESSION_FILE: &str = "state.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no configuration directory is available for this user")]
    ConfigDirNotFound,
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot encode settings: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("cannot decode settings: {0}")]
    TomlDe(#[from] toml::de::Error),
}

/// Keeps the user settings (`config.toml`) and the session state
/// (`state.toml`: last pin and map region) in one directory.
pub struct StorageManager {
    config_dir: PathBuf,
}

impl StorageManager {
    /// Uses the platform configuration directory for Virtual Tourist.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigDirNotFound` when the platform has no home directory.
    pub fn new() -> Result<Self, ConfigError> {
        ProjectDirs::from(crate::APP_QUALIFIER, crate::APP_ORGANIZATION, crate::NAME)
            .map(|dirs| Self::with_dir(dirs.config_dir().to_path_buf()))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    #[must_use]
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Creates the configuration directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> Result<(), ConfigError> {
        if !self.config_dir.exists() {
            info!(path = %self.config_dir.display(), "Creating settings directory");
            fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    /// Loads the settings from `path_override` or the default location.
    ///
    /// A missing file is created with default settings. A file that does not
    /// parse is left untouched and defaults are used for this run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or the defaults written.
    pub fn load_config(&self, path_override: Option<&Path>) -> Result<AppConfig, ConfigError> {
        let path = match path_override {
            Some(path) => path.to_path_buf(),
            None => {
                self.ensure_config_dir()?;
                self.config_dir.join(SETTINGS_FILE)
            }
        };

        if let Some(config) = read_toml::<AppConfig>(&path, "settings")? {
            return Ok(config);
        }

        info!(path = %path.display(), "Writing default settings");
        let defaults = AppConfig::default();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_toml(&path, &defaults)?;
        Ok(defaults)
    }

    /// Loads the session state; missing or unreadable state starts fresh.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the state file exists but cannot be read.
    pub fn load_state(&self) -> Result<StateConfig, ConfigError> {
        let path = self.config_dir.join(SESSION_FILE);
        Ok(read_toml(&path, "session state")?.unwrap_or_default())
    }

    /// Writes the session state atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be written.
    pub fn save_state(&self, state: &StateConfig) -> Result<(), ConfigError> {
        self.ensure_config_dir()?;
        write_toml(&self.config_dir.join(SESSION_FILE), state)
    }

    /// Applies `change` to the stored session state and saves the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the state cannot be read or written.
    pub fn update_state(&self, change: impl FnOnce(&mut StateConfig)) -> Result<StateConfig, ConfigError> {
        let mut state = self.load_state()?;
        change(&mut state);
        self.save_state(&state)?;
        debug!(last_pin = ?state.last_pin_id, has_region = state.last_region.is_some(), "Session state saved");
        Ok(state)
    }
}

/// Reads a TOML file; `Ok(None)` when it is missing, defaults when malformed.
fn read_toml<T: DeserializeOwned + Default>(path: &Path, what: &str) -> Result<Option<T>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    match toml::from_str(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable {what}");
            Ok(Some(T::default()))
        }
    }
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(value)?;
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::other("settings path has no parent directory"))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
