//! Retry observation and logging
//!
//! The executor reports every state transition to a [`RetryObserver`].
//! [`TracingObserver`] turns them into structured `tracing` events; this is
//! where per-attempt failures are logged before being discarded.

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Callbacks for retry session events
///
/// Attempt numbers are 1-indexed.
pub trait RetryObserver: Send + Sync {
    /// An attempt is about to start
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// An attempt failed and the executor will wait `delay` before retrying
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration);

    /// The operation succeeded on `attempt`
    fn on_success(&self, attempt: u32, total_duration: Duration);

    /// The final attempt failed
    fn on_exhausted(&self, attempts: u32, final_error: &dyn Display);

    /// A predicate refused to retry the error from `attempt`
    fn on_rejected(&self, attempt: u32, error: &dyn Display) {
        let _ = (attempt, error);
    }
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Display, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _final_error: &dyn Display) {}
}

/// Observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_attempt_failed`: WARN
/// - `on_success`: INFO after a retry, DEBUG on the first attempt
/// - `on_exhausted`: ERROR
/// - `on_rejected`: WARN
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    /// Create an observer that tags every event with `operation`
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Operation name used in log events
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("operation")
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt,
            max_attempts,
            "starting attempt"
        );
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, will retry"
        );
    }

    fn on_success(&self, attempt: u32, total_duration: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempts = attempt,
                total_duration_ms = total_duration.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = total_duration.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, final_error: &dyn Display) {
        tracing::error!(
            operation = %self.operation,
            attempts,
            error = %final_error,
            "all retry attempts exhausted"
        );
    }

    fn on_rejected(&self, attempt: u32, error: &dyn Display) {
        tracing::warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            "error is not retryable, giving up"
        );
    }
}

/// Observer that counts events and keeps every failure message
///
/// Useful in tests, and for callers that want the failures the executor
/// itself does not return.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    failures: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    rejections: AtomicU32,
    messages: Mutex<Vec<String>>,
}

impl StatsObserver {
    /// Create an observer with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Failures that were followed by a retry
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    pub fn rejections(&self) -> u32 {
        self.rejections.load(Ordering::SeqCst)
    }

    /// Messages of every failed attempt, in order, including the final one
    pub fn failure_messages(&self) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, error: &dyn Display) {
        let mut messages = match self.messages.lock() {
            Ok(messages) => messages,
            Err(poisoned) => poisoned.into_inner(),
        };
        messages.push(error.to_string());
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_attempt_failed(&self, _attempt: u32, error: &dyn Display, _delay: Duration) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        self.record(error);
    }

    fn on_success(&self, _attempt: u32, _total_duration: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, final_error: &dyn Display) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
        self.record(final_error);
    }

    fn on_rejected(&self, _attempt: u32, error: &dyn Display) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
        self.record(error);
    }
}

macro_rules! forward_observer {
    ($($ptr:ty),*) => {
        $(
            impl<T: RetryObserver + ?Sized> RetryObserver for $ptr {
                fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
                    (**self).on_attempt_start(attempt, max_attempts)
                }

                fn on_attempt_failed(&self, attempt: u32, error: &dyn Display, delay: Duration) {
                    (**self).on_attempt_failed(attempt, error, delay)
                }

                fn on_success(&self, attempt: u32, total_duration: Duration) {
                    (**self).on_success(attempt, total_duration)
                }

                fn on_exhausted(&self, attempts: u32, final_error: &dyn Display) {
                    (**self).on_exhausted(attempts, final_error)
                }

                fn on_rejected(&self, attempt: u32, error: &dyn Display) {
                    (**self).on_rejected(attempt, error)
                }
            }
        )*
    };
}

forward_observer!(Arc<T>, Box<T>, &T);
