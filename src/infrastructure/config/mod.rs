//! Application configuration.

pub mod app_config;
pub mod args;
pub mod state_config;
pub mod storage;

pub use app_config::{AlbumConfig, AppConfig, FlickrConfig, LogLevel};
pub use args::{AlbumCommand, CliArgs, Command, PhotoCommand, PinCommand, RegionCommand};
pub use state_config::StateConfig;
pub use storage::{ConfigError, StorageManager};
