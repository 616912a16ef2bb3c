//! Retry predicates
//!
//! A predicate decides whether a failure is worth another attempt. The
//! default, [`AlwaysRetry`], treats every failure as transient.

use std::fmt;

/// Decides whether an error should be retried
///
/// # Example
///
/// ```rust
/// use flakeguard_core::retry::RetryPredicate;
/// use std::io::{Error, ErrorKind};
///
/// struct IoRetryPredicate;
///
/// impl RetryPredicate<Error> for IoRetryPredicate {
///     fn should_retry(&self, error: &Error) -> bool {
///         !matches!(
///             error.kind(),
///             ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidInput
///         )
///     }
/// }
/// ```
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Whether the given error should be retried
    fn should_retry(&self, error: &E) -> bool;
}

/// Every error is retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// No error is retryable
#[derive(Debug, Clone, Copy)]
pub struct NeverRetry;

impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E) -> bool {
        false
    }
}

/// Predicate backed by a closure
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Wrap a closure as a predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}

/// Retries only errors whose message contains one of the given patterns
///
/// Matching is case-insensitive.
#[derive(Debug, Clone)]
pub struct MessagePredicate {
    patterns: Vec<String>,
}

impl MessagePredicate {
    /// Create a predicate from message patterns
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    /// Patterns for common transient network and browser-driver failures
    pub fn network_errors() -> Self {
        Self::new([
            "timeout",
            "timed out",
            "connection reset",
            "connection refused",
            "network unreachable",
            "temporary failure",
            "stale element",
        ])
    }
}

impl<E: fmt::Display + ?Sized> RetryPredicate<E> for MessagePredicate {
    fn should_retry(&self, error: &E) -> bool {
        let message = error.to_string().to_lowercase();
        self.patterns.iter().any(|p| message.contains(p.as_str()))
    }
}
