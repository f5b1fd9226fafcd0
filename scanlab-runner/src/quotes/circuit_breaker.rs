//! Circuit breaker guarding the quote provider.
//!
//! Repeated failures (HTTP errors, exhausted rate limits) trip the breaker and
//! every request is refused until the cooldown expires. A rejected API key
//! trips it immediately.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Default)]
struct BreakerState {
    tripped_at: Option<Instant>,
    consecutive_failures: u32,
}

/// Consecutive failures that trip the breaker.
const FAILURE_THRESHOLD: u32 = 3;

#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    cooldown: Duration,
}

impl CircuitBreaker {
    /// Breaker with the given cooldown; trips after 3 consecutive failures.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            cooldown,
        }
    }

    /// 30-minute cooldown, the default for a hosted quote API.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a request may go out now. Closes the breaker once the cooldown has passed.
    pub fn is_allowed(&self) -> bool {
        let mut state = self.lock();
        match state.tripped_at {
            None => true,
            Some(at) if at.elapsed() >= self.cooldown => {
                *state = BreakerState::default();
                true
            }
            Some(_) => false,
        }
    }

    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.consecutive_failures += 1;
        if state.consecutive_failures >= FAILURE_THRESHOLD && state.tripped_at.is_none() {
            state.tripped_at = Some(Instant::now());
            warn!(
                failures = state.consecutive_failures,
                cooldown_secs = self.cooldown.as_secs(),
                "quote provider circuit breaker tripped"
            );
        }
    }

    /// Trip immediately (rejected credentials, account blocked).
    pub fn trip(&self) {
        let mut state = self.lock();
        state.tripped_at = Some(Instant::now());
        warn!(
            cooldown_secs = self.cooldown.as_secs(),
            "quote provider circuit breaker tripped"
        );
    }

    /// Remaining cooldown time (zero if not tripped).
    pub fn remaining_cooldown(&self) -> Duration {
        match self.lock().tripped_at {
            None => Duration::ZERO,
            Some(at) => self.cooldown.saturating_sub(at.elapsed()),
        }
    }
}
