//! Retry policy configuration types
//!
//! These types are deserialized from `retry-defaults.yaml`, the user config
//! file, and environment overrides. Keys are kebab-case.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};

/// Retry settings for all operations plus per-operation overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Policy used when no named operation matches
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies, keyed by operation name
    #[serde(default)]
    pub operations: BTreeMap<String, RetryPolicy>,
}

impl RetryConfig {
    /// Get the policy for a named operation, falling back to the default
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    /// Validate the default policy and every named policy
    pub fn validate(&self) -> Result<()> {
        self.default
            .validate()
            .map_err(|e| Error::invalid_config(format!("default: {}", e)))?;

        for (name, policy) in &self.operations {
            policy
                .validate()
                .map_err(|e| Error::invalid_config(format!("operations.{}: {}", name, e)))?;
        }

        Ok(())
    }

    /// Overlay another config on top of this one
    ///
    /// The overlay's default replaces ours; named operations are merged
    /// key by key with the overlay winning.
    pub fn merge(mut self, overlay: RetryConfig) -> RetryConfig {
        self.default = overlay.default;
        self.operations.extend(overlay.operations);
        self
    }
}

/// Retry policy for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Maximum number of invocations, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay strategy between attempts
    #[serde(default)]
    pub strategy: BackoffStrategy,

    /// Base delay in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Multiplier for exponential backoff
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Upper bound on any computed delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Add up to 25% random delay on top of the computed value
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            strategy: BackoffStrategy::default(),
            delay_ms: default_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay_ms(),
            jitter: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_delay_ms() -> u64 {
    1000
}
fn default_backoff_multiplier() -> f64 {
    2.0
}
fn default_max_delay_ms() -> u64 {
    30000
}

impl RetryPolicy {
    /// Constant-delay policy, the reference behavior of `retry_on_failure`
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        Self {
            max_attempts,
            strategy: BackoffStrategy::FixedDelay,
            delay_ms,
            max_delay_ms: delay_ms.max(default_max_delay_ms()),
            ..Self::default()
        }
    }

    /// Base delay as a `Duration`
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Delay cap as a `Duration`
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Check the invariants the executor relies on
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_config("max-attempts must be at least 1"));
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::invalid_config(format!(
                "backoff-multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            )));
        }

        if self.max_delay_ms < self.delay_ms {
            return Err(Error::invalid_config(format!(
                "max-delay-ms ({}) must not be less than delay-ms ({})",
                self.max_delay_ms, self.delay_ms
            )));
        }

        Ok(())
    }
}

/// Delay strategy between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackoffStrategy {
    /// Retry immediately
    None,

    /// Same delay before every retry (default)
    #[default]
    FixedDelay,

    /// Delay grows by the base delay each attempt
    LinearBackoff,

    /// Delay is multiplied each attempt
    ExponentialBackoff,
}

impl BackoffStrategy {
    /// Accepted spellings, for help text and error messages
    pub const VARIANTS: &'static [&'static str] =
        &["none", "fixed-delay", "linear-backoff", "exponential-backoff"];

    /// Kebab-case name as it appears in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            BackoffStrategy::None => "none",
            BackoffStrategy::FixedDelay => "fixed-delay",
            BackoffStrategy::LinearBackoff => "linear-backoff",
            BackoffStrategy::ExponentialBackoff => "exponential-backoff",
        }
    }
}

impl fmt::Display for BackoffStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackoffStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(BackoffStrategy::None),
            "fixed" | "fixed-delay" | "constant" => Ok(BackoffStrategy::FixedDelay),
            "linear" | "linear-backoff" => Ok(BackoffStrategy::LinearBackoff),
            "exponential" | "exponential-backoff" => Ok(BackoffStrategy::ExponentialBackoff),
            other => Err(Error::invalid_config(format!(
                "unknown backoff strategy '{}', expected one of: {}",
                other,
                Self::VARIANTS.join(", ")
            ))),
        }
    }
}
