// SPDX-License-Identifier: Apache-2.0

//! Circuit breaker guarding the completion service.
//!
//! Tracks consecutive failures and short-circuits calls for a cool-down
//! period once the threshold is hit. State lives in atomics so a single
//! client can be shared across concurrent pipeline runs.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests pass through.
    Closed,
    /// Requests fail immediately.
    Open,
    /// Cool-down elapsed; the next request decides.
    HalfOpen,
}

/// Consecutive-failure circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_count: AtomicU32,
    /// Seconds since `UNIX_EPOCH` of the failure that tripped the breaker.
    opened_at: AtomicU64,
    threshold: u32,
    reset_seconds: u64,
}

impl CircuitBreaker {
    /// Create a breaker that opens after `threshold` consecutive failures and
    /// stays open for `reset_seconds`.
    #[must_use]
    pub fn new(threshold: u32, reset_seconds: u64) -> Self {
        Self {
            failure_count: AtomicU32::new(0),
            opened_at: AtomicU64::new(0),
            threshold: threshold.max(1),
            reset_seconds,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> CircuitState {
        if self.failure_count.load(Ordering::Relaxed) < self.threshold {
            return CircuitState::Closed;
        }
        let opened_at = self.opened_at.load(Ordering::Relaxed);
        if current_time_secs() < opened_at + self.reset_seconds {
            CircuitState::Open
        } else {
            CircuitState::HalfOpen
        }
    }

    /// Whether calls should be rejected right now.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// Record a successful request (closes the breaker).
    pub fn record_success(&self) {
        self.failure_count.store(0, Ordering::Relaxed);
    }

    /// Record a failed request.
    pub fn record_failure(&self) {
        let new_count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        if new_count >= self.threshold {
            self.opened_at
                .store(current_time_secs(), Ordering::Relaxed);
        }
    }

    /// Consecutive failures seen so far.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.failure_count.load(Ordering::Relaxed)
    }
}

fn current_time_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_closed_initially() {
        let cb = CircuitBreaker::new(3, 60);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn test_circuit_opens_after_threshold() {
        let cb = CircuitBreaker::new(3, 60);

        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());

        cb.record_failure();
        assert!(cb.is_open());
        assert_eq!(cb.failure_count(), 3);
    }

    #[test]
    fn test_circuit_closes_on_success() {
        let cb = CircuitBreaker::new(2, 60);
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_open());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_zero_reset_goes_half_open() {
        let cb = CircuitBreaker::new(1, 0);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert!(!cb.is_open());
    }

    #[test]
    fn test_zero_threshold_treated_as_one() {
        let cb = CircuitBreaker::new(0, 60);
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert!(cb.is_open());
    }
}
