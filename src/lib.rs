//! Virtual Tourist - drop pins on a map and browse photos taken nearby.
//!
//! Pins and their photo records live in a SQLite database, photo bytes in a
//! file cache, and new albums are fetched from the Flickr search API.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the album workflow.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing the command runner.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "virtual-tourist";

/// Qualifier used for platform directories.
pub const APP_QUALIFIER: &str = "com";

/// Organization used for platform directories.
pub const APP_ORGANIZATION: &str = "linuxmobile";
