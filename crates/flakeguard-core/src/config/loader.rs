//! Layered configuration loader
//!
//! Loads retry configuration from multiple sources with the following
//! precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Config file (`--config <path>`, else `~/.flakeguard/config.yaml`)
//! 3. Environment variables (`FLAKEGUARD_*` prefix, default policy only)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{BackoffStrategy, RetryConfig};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::str::FromStr;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "FLAKEGUARD_";

const DEFAULTS_FILE: &str = "retry-defaults.yaml";
const CONFIG_FILE: &str = "config.yaml";

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Raw text of the embedded defaults, used by `config init`
pub fn embedded_defaults_yaml() -> Result<String> {
    let file = EmbeddedConfigs::get(DEFAULTS_FILE)
        .ok_or_else(|| Error::config_not_found(DEFAULTS_FILE))?;

    String::from_utf8(file.data.into_owned()).map_err(|_| {
        Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", DEFAULTS_FILE))
    })
}

/// Resolves a [`RetryConfig`] from defaults, file, and environment
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Explicit config file; must exist when set
    explicit_file: Option<Utf8PathBuf>,
    /// Directory searched for `config.yaml` when no explicit file is given
    config_dir: Option<Utf8PathBuf>,
    /// Environment snapshot; `None` reads the process environment
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Loader using `~/.flakeguard` and the process environment
    pub fn new() -> Self {
        Self {
            explicit_file: None,
            config_dir: Self::default_config_dir(),
            env: None,
        }
    }

    /// Use an explicit config file instead of the home directory one
    pub fn with_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    /// Search `dir` for `config.yaml`
    pub fn with_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Read overrides from the given variables instead of the process environment
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// `~/.flakeguard`, if a home directory can be determined
    fn default_config_dir() -> Option<Utf8PathBuf> {
        let home = dirs::home_dir()?;
        let home = Utf8PathBuf::from_path_buf(home).ok()?;
        Some(home.join(".flakeguard"))
    }

    /// Config file that will be read, if any
    pub fn config_file(&self) -> Option<Utf8PathBuf> {
        if let Some(path) = &self.explicit_file {
            return Some(path.clone());
        }

        self.config_dir
            .as_ref()
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|path| path.exists())
    }

    /// Load, merge, apply overrides, and validate
    pub fn load(&self) -> Result<RetryConfig> {
        let mut config = Self::load_embedded_config::<RetryConfig>(DEFAULTS_FILE)?;

        if let Some(path) = self.config_file() {
            if !path.exists() {
                return Err(Error::config_not_found(path.as_str()));
            }
            tracing::debug!(path = %path, "loading retry config file");
            let file_config = Self::load_yaml_file::<RetryConfig>(&path)?;
            config = config.merge(file_config);
        }

        self.apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse and validate a single file without merging
    pub fn load_file(path: &Utf8Path) -> Result<RetryConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }
        let config = Self::load_yaml_file::<RetryConfig>(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file =
            EmbeddedConfigs::get(filename).ok_or_else(|| Error::config_not_found(filename))?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    fn var(&self, suffix: &str) -> Option<String> {
        let key = format!("{}{}", ENV_PREFIX, suffix);
        match &self.env {
            Some(vars) => vars.get(&key).cloned(),
            None => env::var(&key).ok(),
        }
    }

    fn parse_var<T: FromStr>(&self, suffix: &str) -> Result<Option<T>> {
        match self.var(suffix) {
            None => Ok(None),
            Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
                Error::invalid_config(format!(
                    "{}{} has an invalid value: '{}'",
                    ENV_PREFIX, suffix, raw
                ))
            }),
        }
    }

    /// Apply environment variable overrides to the default policy
    fn apply_env_overrides(&self, config: &mut RetryConfig) -> Result<()> {
        let policy = &mut config.default;

        if let Some(val) = self.parse_var::<u32>("MAX_ATTEMPTS")? {
            policy.max_attempts = val;
        }

        if let Some(val) = self.parse_var::<u64>("DELAY_MS")? {
            policy.delay_ms = val;
        }

        if let Some(val) = self.parse_var::<u64>("MAX_DELAY_MS")? {
            policy.max_delay_ms = val;
        }

        if let Some(raw) = self.var("STRATEGY") {
            policy.strategy = BackoffStrategy::from_str(&raw)?;
        }

        if let Some(val) = self.parse_var::<bool>("JITTER")? {
            policy.jitter = val;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
