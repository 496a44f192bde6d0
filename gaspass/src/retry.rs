//! Bounded retry for operations that race the pairing transport.
//!
//! The transport registers proposals asynchronously. A proposal event may be
//! delivered before the proposal is listed as pending, and an approval may
//! fail transiently while the relay catches up. Both accommodations live
//! here with fixed bounds: [`recheck`] waits once before giving up on a
//! lookup, [`retry`] repeats an operation with growing delays while its error
//! is transient.

use std::future::Future;
use std::time::Duration;

/// Attempt count and backoff for [`retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Factor applied to the delay after each further failure.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const NONE: Self = Self {
        max_attempts: 1,
        initial_delay: Duration::ZERO,
        multiplier: 1,
    };

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }
}

/// Runs `op` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are spent. `op` receives the 1-based attempt number.
///
/// # Errors
///
/// Returns the last error produced by `op`.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    is_transient: impl Fn(&E) -> bool,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(attempt, max_attempts, ?delay, error = %e, "Transient failure, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Looks something up, and if it is missing waits `delay` and looks once more.
pub async fn recheck<T>(delay: Duration, mut lookup: impl FnMut() -> Option<T>) -> Option<T> {
    if let Some(found) = lookup() {
        return Some(found);
    }
    tokio::time::sleep(delay).await;
    lookup()
}

const DEAD_PROPOSAL_MARKERS: &[&str] = &[
    "deleted",
    "expired",
    "already",
    "processed",
    "no matching key",
    "does not exist",
    "doesn't exist",
    "no longer pending",
    "invalid",
];

/// Whether a transport failure message says the proposal can never be
/// approved (deleted, expired, already processed, or malformed).
#[must_use]
pub fn is_dead_proposal_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    DEAD_PROPOSAL_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
