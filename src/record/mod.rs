//! Recorder and metrics interfaces.
//!
//! The engine emits structured output through these traits fire-and-forget:
//! a sink failure is logged and swallowed, never allowed to block trading.
//! Durable storage and metrics registration live behind them, outside this
//! crate.

use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::{Attempt, Fill};

/// Metric names mirrored by downstream exporters.
pub mod names {
    pub const ATTEMPTS_TOTAL: &str = "orders_total";
    pub const FILLS_TOTAL: &str = "fills_total";
    pub const SKIPS_TOTAL: &str = "skips_total";
    pub const PROFIT_TOTAL: &str = "profit_total_usdt";
    pub const CYCLE_LATENCY: &str = "cycle_latency_seconds";
}

/// Receives finalized attempts and individual fills.
pub trait AttemptRecorder: Send + Sync {
    fn record_attempt(&self, attempt: &Attempt);
    fn record_fill(&self, fill: &Fill);
}

/// Receives engine counters, gauges, and latency observations.
pub trait MetricsSink: Send + Sync {
    /// Count one finalized attempt by outcome label.
    fn incr_attempt(&self, venue: &str, outcome: &str);
    /// Count one skipped cycle by reason label.
    fn incr_skip(&self, venue: &str, reason: &str);
    /// Observe one attempt's end-to-end latency.
    fn observe_latency(&self, venue: &str, latency: Duration);
    /// Update cumulative realized PnL in the quote currency.
    fn add_realized_pnl(&self, venue: &str, pnl: Decimal);
}

/// Recorder that emits attempts and fills as structured log events.
pub struct LogRecorder;

impl AttemptRecorder for LogRecorder {
    fn record_attempt(&self, attempt: &Attempt) {
        match serde_json::to_string(attempt) {
            Ok(json) => info!(target: "arbit::attempts", %json, "attempt"),
            Err(e) => warn!(error = %e, "failed to serialize attempt record"),
        }
    }

    fn record_fill(&self, fill: &Fill) {
        match serde_json::to_string(fill) {
            Ok(json) => info!(target: "arbit::fills", %json, "fill"),
            Err(e) => warn!(error = %e, "failed to serialize fill record"),
        }
    }
}

/// Metrics sink that logs observations instead of exporting them.
pub struct LogMetrics;

impl MetricsSink for LogMetrics {
    fn incr_attempt(&self, venue: &str, outcome: &str) {
        info!(target: "arbit::metrics", metric = names::ATTEMPTS_TOTAL, venue, outcome, "incr");
    }

    fn incr_skip(&self, venue: &str, reason: &str) {
        info!(target: "arbit::metrics", metric = names::SKIPS_TOTAL, venue, reason, "incr");
    }

    fn observe_latency(&self, venue: &str, latency: Duration) {
        info!(
            target: "arbit::metrics",
            metric = names::CYCLE_LATENCY,
            venue,
            seconds = latency.as_secs_f64(),
            "observe"
        );
    }

    fn add_realized_pnl(&self, venue: &str, pnl: Decimal) {
        info!(target: "arbit::metrics", metric = names::PROFIT_TOTAL, venue, pnl = %pnl, "add");
    }
}

/// No-op recorder for tests.
pub struct NullRecorder;

impl AttemptRecorder for NullRecorder {
    fn record_attempt(&self, _attempt: &Attempt) {}
    fn record_fill(&self, _fill: &Fill) {}
}

/// No-op metrics sink for tests.
pub struct NullMetrics;

impl MetricsSink for NullMetrics {
    fn incr_attempt(&self, _venue: &str, _outcome: &str) {}
    fn incr_skip(&self, _venue: &str, _reason: &str) {}
    fn observe_latency(&self, _venue: &str, _latency: Duration) {}
    fn add_realized_pnl(&self, _venue: &str, _pnl: Decimal) {}
}
