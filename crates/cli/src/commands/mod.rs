//! Subcommand implementations.

pub mod ask;
pub mod doctor;
pub mod serve;

use std::path::Path;

use amparo_config::{AppConfig, ConfigError};

/// Load configuration, honoring an explicit `--config` path.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_at(path),
        None => AppConfig::load(),
    }
}
