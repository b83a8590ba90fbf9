//! Presentation layer with the command runner and console output.

/// Command runner.
pub mod app;
/// Change event logging.
pub mod events;
/// Console formatting.
pub mod output;

pub use app::App;
