//! Public contract of `retry_on_failure`
//!
//! Invocation counts, returned values, surfaced errors, and wall-clock
//! lower bounds for the fixed-delay retry helper.

use std::cell::Cell;
use std::io;
use std::time::{Duration, Instant};

use flakeguard_core::retry::{
    retry_on_failure, retry_on_failure_default, RetryError, DEFAULT_MAX_ATTEMPTS,
};

const TEST_DELAY: Duration = Duration::from_millis(5);

// ─── Helpers ───────────────────────────────────────────────────────────────

/// Operation that fails `failures` times with distinct messages, then returns `value`
fn flaky<'a>(
    calls: &'a Cell<u32>,
    failures: u32,
    value: &'static str,
) -> impl FnMut() -> Result<&'static str, io::Error> + 'a {
    move || {
        calls.set(calls.get() + 1);
        if calls.get() <= failures {
            Err(io::Error::other(format!("simulated failure {}", calls.get())))
        } else {
            Ok(value)
        }
    }
}

// ─── Success paths ─────────────────────────────────────────────────────────

#[test]
fn test_fails_twice_then_returns_ok() {
    let calls = Cell::new(0);

    let result = retry_on_failure(flaky(&calls, 2, "ok"), 5, Duration::ZERO);

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(calls.get(), 3);
}

#[test]
fn test_fails_k_times_invokes_k_plus_one() {
    for k in 0..4 {
        let calls = Cell::new(0);

        let result = retry_on_failure(flaky(&calls, k, "done"), 5, Duration::ZERO);

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.get(), k + 1);
    }
}

#[test]
fn test_first_attempt_success_has_no_delay() {
    let calls = Cell::new(0);
    let started = Instant::now();

    let result = retry_on_failure(flaky(&calls, 0, "immediate"), 3, Duration::from_secs(10));

    assert_eq!(result.unwrap(), "immediate");
    assert_eq!(calls.get(), 1);
    assert!(started.elapsed() < Duration::from_secs(10));
}

// ─── Exhaustion ────────────────────────────────────────────────────────────

#[test]
fn test_always_failing_surfaces_boom_after_three_calls() {
    let calls = Cell::new(0);

    let result: Result<(), _> = retry_on_failure(
        || {
            calls.set(calls.get() + 1);
            Err(io::Error::other("boom"))
        },
        3,
        TEST_DELAY,
    );

    let err = result.unwrap_err();
    assert_eq!(calls.get(), 3);
    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 3);
    assert_eq!(err.into_source().to_string(), "boom");
}

#[test]
fn test_exhaustion_carries_error_from_last_call() {
    let calls = Cell::new(0);

    let result = retry_on_failure(flaky(&calls, u32::MAX, "never"), 4, Duration::ZERO);

    match result {
        Err(RetryError::Exhausted {
            attempts, source, ..
        }) => {
            assert_eq!(attempts, 4);
            assert_eq!(source.to_string(), "simulated failure 4");
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn test_single_attempt_means_no_retry() {
    let failing_calls = Cell::new(0);
    let failing = retry_on_failure(flaky(&failing_calls, 1, "late"), 1, TEST_DELAY);
    assert!(failing.unwrap_err().is_exhausted());
    assert_eq!(failing_calls.get(), 1);

    let passing_calls = Cell::new(0);
    let passing = retry_on_failure(flaky(&passing_calls, 0, "first"), 1, TEST_DELAY);
    assert_eq!(passing.unwrap(), "first");
    assert_eq!(passing_calls.get(), 1);
}

// ─── Timing ────────────────────────────────────────────────────────────────

#[test]
fn test_elapsed_is_at_least_failures_times_delay() {
    let delay = Duration::from_millis(10);
    let calls = Cell::new(0);
    let started = Instant::now();

    let result = retry_on_failure(flaky(&calls, 3, "eventually"), 5, delay);

    assert_eq!(result.unwrap(), "eventually");
    assert!(started.elapsed() >= delay * 3);
}

#[test]
fn test_error_display_mentions_attempts_and_cause() {
    let result: Result<(), RetryError<String>> =
        retry_on_failure(|| Err("element not interactable".to_string()), 2, Duration::ZERO);

    let message = result.unwrap_err().to_string();
    assert!(message.contains("2 attempts"));
    assert!(message.contains("element not interactable"));
}

#[test]
fn test_default_helper_uses_three_attempts() {
    let calls = Cell::new(0);

    let result = retry_on_failure_default(flaky(&calls, 0, "fine"));

    assert_eq!(result.unwrap(), "fine");
    assert_eq!(calls.get(), 1);
    assert_eq!(DEFAULT_MAX_ATTEMPTS, 3);
}
