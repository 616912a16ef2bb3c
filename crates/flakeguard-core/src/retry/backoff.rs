//! Delay strategies consulted between attempts
//!
//! Every strategy sits behind the [`Backoff`] trait. The executor asks for
//! the delay after attempt `n` fails (`n` is 1-indexed) and never asks after
//! the final attempt.

use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::types::{BackoffStrategy, RetryPolicy};

/// Computes how long to wait after a failed attempt
pub trait Backoff: Send + Sync {
    /// Delay to wait after `attempt` (1-indexed) failed
    fn delay(&self, attempt: u32) -> Duration;
}

/// A bare `Duration` is a constant delay
impl Backoff for Duration {
    fn delay(&self, _attempt: u32) -> Duration {
        *self
    }
}

/// Retry immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Backoff for NoDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// The same delay before every retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constant(pub Duration);

impl Backoff for Constant {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// `base * attempt`, capped at `max`
#[derive(Debug, Clone, Copy)]
pub struct Linear {
    pub base: Duration,
    pub max: Duration,
}

impl Backoff for Linear {
    fn delay(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt.max(1)).min(self.max)
    }
}

/// `base * multiplier^(attempt - 1)`, capped at `max`
#[derive(Debug, Clone, Copy)]
pub struct Exponential {
    pub base: Duration,
    pub multiplier: f64,
    pub max: Duration,
}

impl Backoff for Exponential {
    fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.base.as_secs_f64() * self.multiplier.powi(exponent);

        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            return self.max;
        }

        Duration::try_from_secs_f64(secs).map_or(self.max, |delay| delay.min(self.max))
    }
}

/// Adds up to 25% random delay on top of the wrapped strategy
#[derive(Debug, Clone, Copy)]
pub struct Jittered<B>(pub B);

impl<B: Backoff> Backoff for Jittered<B> {
    fn delay(&self, attempt: u32) -> Duration {
        add_jitter(self.0.delay(attempt))
    }
}

fn add_jitter(delay: Duration) -> Duration {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let range = millis / 4;
    if range == 0 {
        return delay;
    }
    delay.saturating_add(Duration::from_millis(rand::rng().random_range(0..=range)))
}

/// Backoff built from a [`RetryPolicy`]
#[derive(Debug, Clone, Copy)]
pub struct PolicyBackoff {
    strategy: BackoffStrategy,
    base: Duration,
    multiplier: f64,
    max: Duration,
    jitter: bool,
}

impl PolicyBackoff {
    /// Strategy this backoff dispatches to
    pub fn strategy(&self) -> BackoffStrategy {
        self.strategy
    }
}

impl From<&RetryPolicy> for PolicyBackoff {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            strategy: policy.strategy,
            base: policy.delay(),
            multiplier: policy.backoff_multiplier,
            max: policy.max_delay(),
            jitter: policy.jitter,
        }
    }
}

impl Backoff for PolicyBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.strategy {
            BackoffStrategy::None => Duration::ZERO,
            BackoffStrategy::FixedDelay => self.base.min(self.max),
            BackoffStrategy::LinearBackoff => Linear {
                base: self.base,
                max: self.max,
            }
            .delay(attempt),
            BackoffStrategy::ExponentialBackoff => Exponential {
                base: self.base,
                multiplier: self.multiplier,
                max: self.max,
            }
            .delay(attempt),
        };

        if self.jitter {
            add_jitter(delay)
        } else {
            delay
        }
    }
}

impl<B: Backoff + ?Sized> Backoff for &B {
    fn delay(&self, attempt: u32) -> Duration {
        (**self).delay(attempt)
    }
}

impl<B: Backoff + ?Sized> Backoff for Box<B> {
    fn delay(&self, attempt: u32) -> Duration {
        (**self).delay(attempt)
    }
}

impl<B: Backoff + ?Sized> Backoff for Arc<B> {
    fn delay(&self, attempt: u32) -> Duration {
        (**self).delay(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_constant_never_grows() {
        let backoff = Constant(ms(500));
        for attempt in 1..=10 {
            assert_eq!(backoff.delay(attempt), ms(500));
        }
    }

    #[test]
    fn test_duration_is_constant() {
        assert_eq!(ms(40).delay(1), ms(40));
        assert_eq!(ms(40).delay(7), ms(40));
    }

    #[test]
    fn test_linear_increments_and_caps() {
        let backoff = Linear {
            base: ms(100),
            max: ms(250),
        };
        assert_eq!(backoff.delay(1), ms(100));
        assert_eq!(backoff.delay(2), ms(200));
        assert_eq!(backoff.delay(3), ms(250));
    }

    #[test]
    fn test_exponential_doubles_and_caps() {
        let backoff = Exponential {
            base: ms(100),
            multiplier: 2.0,
            max: ms(1000),
        };
        assert_eq!(backoff.delay(1), ms(100));
        assert_eq!(backoff.delay(2), ms(200));
        assert_eq!(backoff.delay(3), ms(400));
        assert_eq!(backoff.delay(4), ms(800));
        assert_eq!(backoff.delay(5), ms(1000));
    }

    #[test]
    fn test_exponential_keeps_sub_millisecond_base() {
        let backoff = Exponential {
            base: Duration::from_micros(500),
            multiplier: 2.0,
            max: ms(1000),
        };
        assert_eq!(backoff.delay(1), Duration::from_micros(500));
        assert_eq!(backoff.delay(2), ms(1));
        assert_eq!(backoff.delay(3), ms(2));
    }

    #[test]
    fn test_exponential_huge_attempt_saturates() {
        let backoff = Exponential {
            base: ms(1000),
            multiplier: 10.0,
            max: ms(30_000),
        };
        assert_eq!(backoff.delay(u32::MAX), ms(30_000));
    }

    #[test]
    fn test_jitter_bounds() {
        let backoff = Jittered(Constant(ms(1000)));
        for _ in 0..100 {
            let delay = backoff.delay(1);
            assert!(delay >= ms(1000));
            assert!(delay <= ms(1250));
        }
    }

    #[test]
    fn test_jitter_saturates_at_duration_max() {
        assert_eq!(Jittered(Constant(Duration::MAX)).delay(1), Duration::MAX);

        let linear = Jittered(Linear {
            base: Duration::MAX,
            max: Duration::MAX,
        });
        assert_eq!(linear.delay(3), Duration::MAX);
    }

    #[test]
    fn test_jitter_leaves_zero_alone() {
        assert_eq!(Jittered(NoDelay).delay(3), Duration::ZERO);
    }

    #[test]
    fn test_policy_backoff_fixed() {
        let policy = RetryPolicy::fixed(3, ms(300));
        let backoff = PolicyBackoff::from(&policy);
        assert_eq!(backoff.strategy(), BackoffStrategy::FixedDelay);
        assert_eq!(backoff.delay(1), ms(300));
        assert_eq!(backoff.delay(2), ms(300));
    }

    #[test]
    fn test_policy_backoff_none() {
        let policy = RetryPolicy {
            strategy: BackoffStrategy::None,
            ..RetryPolicy::default()
        };
        assert_eq!(PolicyBackoff::from(&policy).delay(2), Duration::ZERO);
    }

    #[test]
    fn test_policy_backoff_exponential_custom_multiplier() {
        let policy = RetryPolicy {
            strategy: BackoffStrategy::ExponentialBackoff,
            delay_ms: 100,
            backoff_multiplier: 3.0,
            max_delay_ms: 100_000,
            ..RetryPolicy::default()
        };
        let backoff = PolicyBackoff::from(&policy);
        assert_eq!(backoff.delay(1), ms(100));
        assert_eq!(backoff.delay(2), ms(300));
        assert_eq!(backoff.delay(3), ms(900));
    }

    #[test]
    fn test_policy_backoff_linear() {
        let policy = RetryPolicy {
            strategy: BackoffStrategy::LinearBackoff,
            delay_ms: 50,
            ..RetryPolicy::default()
        };
        let backoff = PolicyBackoff::from(&policy);
        assert_eq!(backoff.delay(1), ms(50));
        assert_eq!(backoff.delay(4), ms(200));
    }

    #[test]
    fn test_boxed_backoff() {
        let backoff: Box<dyn Backoff> = Box::new(Constant(ms(5)));
        assert_eq!(backoff.delay(1), ms(5));
    }
}
