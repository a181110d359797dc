//! Round-level retry delays, decoupled from the oracle calls themselves.

use std::time::Duration;

use rand::Rng;

/// Why the previous round attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The generation oracle signalled throttling.
    RateLimited,
    /// The round produced no structurally valid candidate.
    NoValidCandidate,
}

/// Base delay for non-throttled retries. Actual delay is base * 3^attempt
/// plus 0-1s of jitter.
const RETRY_BASE: Duration = Duration::from_secs(3);
/// Fixed cool-down after a rate-limit failure.
const RATE_LIMIT_DELAY: Duration = Duration::from_secs(45);

#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    base: Duration,
    rate_limit_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: RETRY_BASE,
            rate_limit_delay: RATE_LIMIT_DELAY,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base: Duration, rate_limit_delay: Duration) -> Self {
        Self {
            base,
            rate_limit_delay,
        }
    }

    /// Delay to apply before retry number `attempt` (0-based).
    pub fn next_delay(&self, attempt: u32, kind: FailureKind) -> Duration {
        match kind {
            FailureKind::RateLimited => self.rate_limit_delay,
            FailureKind::NoValidCandidate => {
                let backoff = self.base * 3u32.pow(attempt);
                let jitter = Duration::from_millis(rand::rng().random_range(0..1000));
                backoff + jitter
            }
        }
    }
}
