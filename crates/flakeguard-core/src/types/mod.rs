//! Type definitions shared by the retry executor, config loader, and CLI

mod retry_policy;

pub use retry_policy::{BackoffStrategy, RetryConfig, RetryPolicy};
