//! Error types for the retry executor
//!
//! A session ends in failure in one of two ways: every attempt failed
//! (`Exhausted`), or a predicate refused to retry (`NonRetryable`). Only the
//! failure from the final attempt is carried; earlier failures are reported
//! to the observer and then dropped.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// Errors that end a retry session
///
/// Generic over `E`, the error type produced by the wrapped operation.
#[derive(Debug)]
pub enum RetryError<E> {
    /// All attempts were used and the last one failed
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// The error from the final attempt
        source: E,
        /// Wall-clock time from the first attempt to giving up
        total_duration: Duration,
    },

    /// A predicate classified the error as permanent
    NonRetryable {
        /// The attempt that produced the error
        attempt: u32,
        /// The rejected error
        source: E,
    },
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => write!(
                f,
                "retry exhausted after {} attempts over {:.2}s: {}",
                attempts,
                total_duration.as_secs_f64(),
                source
            ),
            RetryError::NonRetryable { attempt, source } => {
                write!(f, "non-retryable error on attempt {}: {}", attempt, source)
            }
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => {
                Some(source)
            }
        }
    }
}

impl<E> RetryError<E> {
    /// Create an exhausted error
    pub fn exhausted(attempts: u32, source: E, total_duration: Duration) -> Self {
        RetryError::Exhausted {
            attempts,
            source,
            total_duration,
        }
    }

    /// Create a non-retryable error
    pub fn non_retryable(attempt: u32, source: E) -> Self {
        RetryError::NonRetryable { attempt, source }
    }

    /// Number of times the operation was invoked
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::NonRetryable { attempt, .. } => *attempt,
        }
    }

    /// Whether all attempts were used
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Whether a predicate stopped the session early
    pub fn is_non_retryable(&self) -> bool {
        matches!(self, RetryError::NonRetryable { .. })
    }

    /// Consume this error and return the operation's last error
    pub fn into_source(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => {
                source
            }
        }
    }

    /// Borrow the operation's last error
    pub fn source_ref(&self) -> &E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::NonRetryable { source, .. } => {
                source
            }
        }
    }

    /// Map the wrapped error, keeping attempt counts and timing
    pub fn map_err<F, E2>(self, f: F) -> RetryError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            RetryError::Exhausted {
                attempts,
                source,
                total_duration,
            } => RetryError::Exhausted {
                attempts,
                source: f(source),
                total_duration,
            },
            RetryError::NonRetryable { attempt, source } => RetryError::NonRetryable {
                attempt,
                source: f(source),
            },
        }
    }
}
