use super::app_config::LogLevel;
use crate::domain::entities::{PhotoId, PinId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "virtual-tourist",
    version,
    about = "Drop pins on a map and browse photos taken nearby",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// Directory holding the pin database.
    #[arg(long, value_name = "PATH", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Directory holding downloaded photos.
    #[arg(long, value_name = "PATH", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Flickr API key.
    #[arg(long, env = "FLICKR_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage map pins.
    #[command(subcommand)]
    Pin(PinCommand),
    /// Show or refresh a pin's photo album.
    #[command(subcommand)]
    Album(AlbumCommand),
    /// Work with single photos of an album.
    #[command(subcommand)]
    Photo(PhotoCommand),
    /// Remembered map region.
    #[command(subcommand)]
    Region(RegionCommand),
}

#[derive(Debug, Clone, Subcommand)]
pub enum PinCommand {
    /// Drops a pin at a coordinate.
    #[command(allow_negative_numbers = true)]
    Add { latitude: f64, longitude: f64 },
    /// Lists all pins.
    List,
    /// Deletes a pin with its photos.
    Delete { pin: PinId },
    /// Finds the pin placed at a coordinate.
    #[command(allow_negative_numbers = true)]
    Find { latitude: f64, longitude: f64 },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AlbumCommand {
    /// Shows the album, searching for photos if it has none yet.
    Show { pin: PinId },
    /// Replaces the album with a new random page of photos.
    Refresh { pin: PinId },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PhotoCommand {
    /// Removes one photo from an album.
    Delete { pin: PinId, photo: PhotoId },
    /// Prints the cached file of a photo.
    Path { pin: PinId, photo: PhotoId },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RegionCommand {
    /// Prints the remembered region.
    Show,
    /// Remembers a region.
    #[command(allow_negative_numbers = true)]
    Set {
        latitude: f64,
        longitude: f64,
        latitude_delta: f64,
        longitude_delta: f64,
    },
}
