//! Shared retry policy
//!
//! Exponential backoff with jitter, used wherever a driver or backend talks
//! to a throttled remote: the streaming source, the queue sink and the
//! document-store backend. Delay for attempt `n` (zero-based) is
//! `base * 2^n` plus a random jitter of up to one base interval.

use std::time::Duration;

use rand::Rng;

/// Default base interval between attempts
pub const DEFAULT_BASE: Duration = Duration::from_millis(100);

/// Default number of attempts before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// A bounded exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base: Duration,
    max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// Total number of attempts allowed (initial try included)
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether `attempt` (zero-based) was the final allowed attempt
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt + 1 >= self.max_attempts
    }

    /// Backoff delay before retrying after a failed `attempt` (zero-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        // Cap the exponent so the multiplier cannot overflow.
        let exponent = attempt.min(16);
        let backoff = self.base.saturating_mul(1u32 << exponent);
        let jitter_ms = self.base.as_millis().max(1) as u64;
        backoff + Duration::from_millis(rand::rng().random_range(0..jitter_ms))
    }
}
