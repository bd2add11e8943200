mod config;
mod error;
mod format;
mod log;
mod rotate;

use std::path::PathBuf;

pub use config::{LoggerConfig, RotationPolicy};
pub use error::LoggerError;
pub use format::LoggerFormat;
pub use log::{LoggerHandle, logger_build, logger_build_with_console};
pub use rotate::RotatingFile;

/// Builds the run's logging pipeline and installs it globally.
///
/// Returns the path of the full log file, or `None` when no log directory is configured.
pub fn logger_init(name: &str, cfg: &LoggerConfig) -> Result<Option<PathBuf>, LoggerError> {
    logger_build(name, cfg)?.init()
}
