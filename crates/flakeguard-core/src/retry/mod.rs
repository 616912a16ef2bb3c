//! Retry executor for flaky operations
//!
//! Wraps a zero-argument operation and re-invokes it after a delay until it
//! succeeds or the attempt ceiling is reached. When every attempt fails, the
//! caller gets the error from the last attempt; earlier errors are logged and
//! dropped.
//!
//! # Features
//!
//! - `retry_on_failure`: fixed delay, blocking, logs through `tracing`
//! - Pluggable delay strategies behind the `Backoff` trait
//! - Predicates to stop early on permanent errors (all errors retry by default)
//! - Observers for logging and statistics
//! - Blocking and async execution with identical semantics
//!
//! # Example
//!
//! ```rust,no_run
//! use flakeguard_core::retry::{retry_on_failure, RetryError};
//! use std::time::Duration;
//!
//! fn example() -> Result<String, RetryError<std::io::Error>> {
//!     retry_on_failure(|| {
//!         // Your fallible operation here
//!         Ok("success".to_string())
//!     }, 3, Duration::from_secs(1))
//! }
//! ```

mod backoff;
mod error;
mod executor;
mod observer;
mod predicate;

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::types::RetryPolicy;

pub use backoff::{Backoff, Constant, Exponential, Jittered, Linear, NoDelay, PolicyBackoff};
pub use error::RetryError;
pub use executor::{RetryExecutor, RetryExecutorBuilder, DEFAULT_DELAY, DEFAULT_MAX_ATTEMPTS};
pub use observer::{NoOpObserver, RetryObserver, StatsObserver, TracingObserver};
pub use predicate::{AlwaysRetry, ClosurePredicate, MessagePredicate, NeverRetry, RetryPredicate};

/// Invoke `operation` up to `max_retries` times, sleeping `delay` between failures
///
/// `max_retries` counts every invocation, so `1` means no retry at all; `0`
/// is treated as `1`. Each failure and the final outcome are logged.
pub fn retry_on_failure<F, T, E>(
    operation: F,
    max_retries: u32,
    delay: Duration,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    RetryExecutor::builder()
        .max_attempts(max_retries)
        .backoff(Constant(delay))
        .observer(TracingObserver::default())
        .build()
        .execute(operation)
}

/// [`retry_on_failure`] with three attempts one second apart
pub fn retry_on_failure_default<F, T, E>(operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    retry_on_failure(operation, DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
}

/// Run a blocking operation under a configured policy
///
/// `name` tags the log events.
pub fn retry_with_policy<F, T, E>(
    policy: &RetryPolicy,
    name: &str,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    RetryExecutor::builder()
        .policy(policy)
        .observer(TracingObserver::new(name))
        .build()
        .execute(operation)
}

/// Async counterpart of [`retry_with_policy`]
pub async fn retry_with_policy_async<F, Fut, T, E>(
    policy: &RetryPolicy,
    name: &str,
    operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    RetryExecutor::builder()
        .policy(policy)
        .observer(TracingObserver::new(name))
        .build()
        .execute_async(operation)
        .await
}
