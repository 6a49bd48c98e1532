//! Per-venue circuit breaker.
//!
//! State machine over attempt outcomes: `Closed` trades normally, `Open`
//! skips evaluation outright, `HalfOpen` lets a single trial attempt
//! through after the cooldown. Only `Failed` and `PartiallyUnwound`
//! outcomes count toward the failure streak; skips and rejections leave
//! it untouched.
//!
//! All methods take an explicit `now` so tests can drive the clock.

use std::time::Instant;

use tracing::warn;

use crate::config::BreakerConfig;
use crate::domain::AttemptOutcome;

/// Breaker state for one venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open { since: Instant },
    HalfOpen,
}

impl CircuitState {
    /// Stable label for logs and metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open { .. } => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Failure-driven circuit breaker for one venue.
pub struct CircuitBreaker {
    config: BreakerConfig,
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
    /// Set on fatal configuration errors; the breaker then never leaves
    /// `Open` without operator intervention.
    latched: bool,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            state: CircuitState::Closed,
            consecutive_failures: 0,
            last_failure: None,
            latched: false,
        }
    }

    /// Current state, transitioning `Open` to `HalfOpen` once the
    /// cooldown has elapsed.
    pub fn state(&mut self, now: Instant) -> CircuitState {
        if let CircuitState::Open { since } = self.state {
            if !self.latched && now.duration_since(since) >= self.config.cooldown() {
                self.state = CircuitState::HalfOpen;
            }
        }
        self.state
    }

    /// True when new attempts must be skipped.
    pub fn is_open(&mut self, now: Instant) -> bool {
        matches!(self.state(now), CircuitState::Open { .. })
    }

    /// Current length of the consecutive-failure streak.
    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Fold one terminal attempt outcome into the state machine.
    pub fn record_outcome(&mut self, outcome: &AttemptOutcome, now: Instant) {
        if self.latched {
            return;
        }
        if outcome.counts_as_failure() {
            self.record_failure(now);
        } else if matches!(outcome, AttemptOutcome::Filled) {
            self.record_success();
        }
        // Rejections and skips are neutral.
    }

    /// Permanently open the breaker (fatal configuration error). Only an
    /// operator restart clears this.
    pub fn latch_open(&mut self, now: Instant) {
        warn!("circuit breaker latched open");
        self.state = CircuitState::Open { since: now };
        self.latched = true;
    }

    fn record_failure(&mut self, now: Instant) {
        if matches!(self.state, CircuitState::HalfOpen) {
            self.open(now);
            return;
        }
        // A stale streak outside the rolling window starts over.
        if let Some(last) = self.last_failure {
            if now.duration_since(last) > self.config.window() {
                self.consecutive_failures = 0;
            }
        }
        self.consecutive_failures += 1;
        self.last_failure = Some(now);
        if self.consecutive_failures >= self.config.consecutive_failures {
            self.open(now);
        }
    }

    fn record_success(&mut self) {
        if matches!(self.state, CircuitState::HalfOpen) {
            self.state = CircuitState::Closed;
        }
        self.consecutive_failures = 0;
        self.last_failure = None;
    }

    fn open(&mut self, now: Instant) {
        warn!(
            failures = self.consecutive_failures,
            "circuit breaker opening"
        );
        self.state = CircuitState::Open { since: now };
    }
}
