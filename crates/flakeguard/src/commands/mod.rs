//! Command implementations

pub mod check;
pub mod config;
pub mod run;
pub mod version;

use anyhow::{Context, Result};
use camino::Utf8Path;
use flakeguard_core::{ConfigLoader, RetryConfig};

/// Loader honoring the global `--config` flag
pub(crate) fn loader(config_path: Option<&Utf8Path>) -> ConfigLoader {
    match config_path {
        Some(path) => ConfigLoader::new().with_file(path.to_path_buf()),
        None => ConfigLoader::new(),
    }
}

/// Resolve the effective retry configuration
pub(crate) fn load_config(config_path: Option<&Utf8Path>) -> Result<RetryConfig> {
    loader(config_path)
        .load()
        .context("Failed to load retry configuration")
}
