//! Retry execution engine
//!
//! A session moves through `ATTEMPTING -> WAITING -> ATTEMPTING ...` until it
//! reaches `SUCCEEDED` or `EXHAUSTED` (or `NON_RETRYABLE` when a predicate
//! rejects an error). The blocking path parks the calling thread between
//! attempts; the async path suspends on a tokio timer instead.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::types::RetryPolicy;

use super::backoff::{Backoff, Constant, PolicyBackoff};
use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::predicate::{AlwaysRetry, RetryPredicate};

/// Attempt ceiling used when the caller does not pick one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay between attempts used when the caller does not pick one
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// What to do after a failed attempt
enum Next<E> {
    Wait(Duration),
    Stop(RetryError<E>),
}

/// Builder for configuring a [`RetryExecutor`]
///
/// # Example
///
/// ```rust
/// use flakeguard_core::retry::{Constant, RetryExecutor, TracingObserver};
/// use std::time::Duration;
///
/// let executor = RetryExecutor::builder()
///     .max_attempts(5)
///     .backoff(Constant(Duration::from_millis(200)))
///     .observer(TracingObserver::new("webtables"))
///     .build();
/// ```
pub struct RetryExecutorBuilder<B = Constant, P = AlwaysRetry, O = NoOpObserver> {
    max_attempts: u32,
    backoff: B,
    predicate: P,
    observer: O,
}

impl Default for RetryExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder {
    /// Three attempts, one second apart, every error retried
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Constant(DEFAULT_DELAY),
            predicate: AlwaysRetry,
            observer: NoOpObserver,
        }
    }
}

impl<B, P, O> RetryExecutorBuilder<B, P, O> {
    /// Set the maximum number of invocations, including the first
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay strategy
    pub fn backoff<B2>(self, backoff: B2) -> RetryExecutorBuilder<B2, P, O> {
        RetryExecutorBuilder {
            max_attempts: self.max_attempts,
            backoff,
            predicate: self.predicate,
            observer: self.observer,
        }
    }

    /// Take attempt ceiling and delay strategy from a policy
    pub fn policy(self, policy: &RetryPolicy) -> RetryExecutorBuilder<PolicyBackoff, P, O> {
        self.max_attempts(policy.max_attempts)
            .backoff(PolicyBackoff::from(policy))
    }

    /// Set the predicate that decides which errors are retried
    pub fn predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<B, P2, O> {
        RetryExecutorBuilder {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            predicate,
            observer: self.observer,
        }
    }

    /// Set the observer that receives session events
    pub fn observer<O2>(self, observer: O2) -> RetryExecutorBuilder<B, P, O2> {
        RetryExecutorBuilder {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            predicate: self.predicate,
            observer,
        }
    }

    pub fn build(self) -> RetryExecutor<B, P, O> {
        RetryExecutor {
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            predicate: self.predicate,
            observer: self.observer,
        }
    }
}

/// Runs an operation until it succeeds or the attempt ceiling is reached
///
/// The executor holds configuration only. Each call to [`execute`] or
/// [`execute_async`] is an independent session with its own counter.
///
/// [`execute`]: RetryExecutor::execute
/// [`execute_async`]: RetryExecutor::execute_async
pub struct RetryExecutor<B = Constant, P = AlwaysRetry, O = NoOpObserver> {
    max_attempts: u32,
    backoff: B,
    predicate: P,
    observer: O,
}

impl RetryExecutor {
    pub fn builder() -> RetryExecutorBuilder {
        RetryExecutorBuilder::new()
    }
}

impl<B, P, O> RetryExecutor<B, P, O>
where
    B: Backoff,
    O: RetryObserver,
{
    /// Attempt ceiling, never less than one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Run `op`, blocking the calling thread between attempts
    ///
    /// Returns the first successful value. If every attempt fails, returns
    /// [`RetryError::Exhausted`] carrying the error from the last attempt.
    pub fn execute<F, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
        P: RetryPredicate<E>,
    {
        let max_attempts = self.session_ceiling();
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.observer.on_attempt_start(attempt, max_attempts);

            match op() {
                Ok(value) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Err(err) => match self.after_failure(attempt, max_attempts, err, start) {
                    Next::Wait(delay) => {
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                    Next::Stop(err) => return Err(err),
                },
            }
        }
    }

    /// Run an async `op`, suspending on a tokio timer between attempts
    ///
    /// Same contract as [`execute`](Self::execute). Dropping the returned
    /// future abandons the session at its current suspension point.
    pub async fn execute_async<F, Fut, T, E>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: RetryPredicate<E>,
    {
        let max_attempts = self.session_ceiling();
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.observer.on_attempt_start(attempt, max_attempts);

            match op().await {
                Ok(value) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(value);
                }
                Err(err) => match self.after_failure(attempt, max_attempts, err, start) {
                    Next::Wait(delay) => {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                    }
                    Next::Stop(err) => return Err(err),
                },
            }
        }
    }

    fn session_ceiling(&self) -> u32 {
        if self.max_attempts == 0 {
            tracing::warn!("max_attempts is 0, running the operation once");
        }
        self.max_attempts()
    }

    fn after_failure<E>(&self, attempt: u32, max_attempts: u32, err: E, start: Instant) -> Next<E>
    where
        E: Display,
        P: RetryPredicate<E>,
    {
        if !self.predicate.should_retry(&err) {
            self.observer.on_rejected(attempt, &err);
            return Next::Stop(RetryError::non_retryable(attempt, err));
        }

        if attempt >= max_attempts {
            self.observer.on_exhausted(attempt, &err);
            return Next::Stop(RetryError::exhausted(attempt, err, start.elapsed()));
        }

        let delay = self.backoff.delay(attempt);
        self.observer.on_attempt_failed(attempt, &err, delay);
        Next::Wait(delay)
    }
}
