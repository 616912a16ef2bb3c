//! # flakeguard-core
//!
//! Core library for the flakeguard CLI providing:
//! - Retry executor with bounded attempts and pluggable backoff
//! - Retry policy types (serializable, kebab-case YAML)
//! - Layered configuration loading (embedded defaults, file, environment)

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use retry::{retry_on_failure, retry_on_failure_default, RetryError, RetryExecutor};
pub use types::{BackoffStrategy, RetryConfig, RetryPolicy};
