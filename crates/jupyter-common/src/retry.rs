//! Fixed-delay retry policy for transient reconciliation failures.
//!
//! Each retry is a brand-new reconciliation attempt scheduled by the
//! controller, so the policy is a pure decision over the attempt count rather
//! than a loop around a future.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use jupyter_common::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::new(3, Duration::from_secs(60));
//! assert_eq!(policy.decide(1), RetryDecision::RetryAfter(Duration::from_secs(60)));
//! assert_eq!(policy.decide(3), RetryDecision::GiveUp);
//! ```

use std::time::Duration;

/// Default number of attempts before a transient failure becomes final
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Default delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Retry ceiling and delay applied to transient failures.
///
/// The delay is fixed: attempt N waits exactly as long as attempt 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first (0 = never give up)
    pub max_attempts: u32,
    /// Delay before the next attempt
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_RETRY_LIMIT,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// What to do after a transient failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Schedule another attempt after the given delay
    RetryAfter(Duration),
    /// The ceiling is reached; surface the failure
    GiveUp,
}

impl RetryPolicy {
    /// Create a policy with the given ceiling and delay
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Decide what follows the `attempts`-th failed attempt (1-based).
    pub fn decide(&self, attempts: u32) -> RetryDecision {
        if self.max_attempts > 0 && attempts >= self.max_attempts {
            RetryDecision::GiveUp
        } else {
            RetryDecision::RetryAfter(self.delay)
        }
    }
}
