//! Retry strategies.
//!
//! The single-request client and the batch dispatcher deliberately retry
//! differently: a single call retries immediately, while batch workers sleep a
//! random interval between attempts so that many workers hitting the same
//! backend do not retry in lock-step. Both are expressed as a [`RetryPolicy`]
//! and injected, so tests can substitute deterministic timing.

use std::time::Duration;

use rand::Rng;

/// How many attempts to make and how long to wait between them.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Total attempts, including the first. Always at least 1.
    fn max_attempts(&self) -> u32;

    /// Delay to wait after `failed_attempt` (1-based) before the next one.
    ///
    /// Never consulted after the final attempt.
    fn delay_after(&self, failed_attempt: u32) -> Duration;
}

// ---------------------------------------------------------------------------

/// Retries straight away with no delay. Default for single requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImmediateRetryPolicy {
    attempts: u32,
}

impl ImmediateRetryPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 3;

    /// `attempts` below 1 is raised to 1.
    pub fn new(attempts: u32) -> Self {
        Self {
            attempts: attempts.max(1),
        }
    }
}

impl Default for ImmediateRetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS)
    }
}

impl RetryPolicy for ImmediateRetryPolicy {
    fn max_attempts(&self) -> u32 {
        self.attempts
    }

    fn delay_after(&self, _failed_attempt: u32) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------

/// Sleeps a duration drawn uniformly from `[0, max_jitter)` between attempts.
/// Default for batch workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitteredBackoffPolicy {
    attempts: u32,
    max_jitter: Duration,
}

impl JitteredBackoffPolicy {
    pub const DEFAULT_ATTEMPTS: u32 = 5;
    pub const DEFAULT_MAX_JITTER: Duration = Duration::from_secs(5);

    /// `attempts` below 1 is raised to 1. A zero `max_jitter` disables sleeping.
    pub fn new(attempts: u32, max_jitter: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            max_jitter,
        }
    }

    pub fn max_jitter(&self) -> Duration {
        self.max_jitter
    }
}

impl Default for JitteredBackoffPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS, Self::DEFAULT_MAX_JITTER)
    }
}

impl RetryPolicy for JitteredBackoffPolicy {
    fn max_attempts(&self) -> u32 {
        self.attempts
    }

    fn delay_after(&self, _failed_attempt: u32) -> Duration {
        if self.max_jitter.is_zero() {
            return Duration::ZERO;
        }
        // gen::<f64>() is in [0, 1), which keeps the upper bound exclusive.
        let fraction: f64 = rand::thread_rng().gen();
        self.max_jitter.mul_f64(fraction)
    }
}
