//! Attempt lifecycle records.
//!
//! An [`Attempt`] is one full evaluate-then-execute cycle: created when a
//! quote snapshot is taken, enriched as the engine evaluates and executes,
//! and finalized exactly once with a terminal [`AttemptOutcome`] before
//! being handed to the recorder.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::money::{Price, Qty};
use super::order::Fill;
use super::quote::QuoteView;
use super::triangle::{Leg, Triangle};

/// Unique identifier for one attempt, used to key idempotent ledger and
/// recorder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Generate a fresh identifier.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why an evaluation was skipped before any order was placed.
///
/// `Display` yields stable snake_case tokens suitable as metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    StaleQuote,
    CircuitOpen,
    InsufficientDepth,
    BelowMinNotional,
    BelowThreshold,
    SlippageExceeded,
    InventoryCap,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::StaleQuote => "stale_quote",
            SkipReason::CircuitOpen => "circuit_open",
            SkipReason::InsufficientDepth => "insufficient_depth",
            SkipReason::BelowMinNotional => "below_min_notional",
            SkipReason::BelowThreshold => "below_threshold",
            SkipReason::SlippageExceeded => "slippage_exceeded",
            SkipReason::InventoryCap => "inventory_cap",
        };
        write!(f, "{s}")
    }
}

/// Why an attempt ended without entering a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The risk gate (or the coordinator's re-validation) said no.
    Gate(SkipReason),
    /// Leg 1 placed but nothing executed; no position was opened.
    Leg1NoFill,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Gate(r) => write!(f, "{r}"),
            RejectReason::Leg1NoFill => write!(f, "leg1_no_fill"),
        }
    }
}

/// Terminal state of an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum AttemptOutcome {
    /// All three legs filled (possibly partially, each nonzero).
    Filled,
    /// A later leg missed and the open position was flattened back out.
    PartiallyUnwound { cause: String },
    /// Nothing executed; no position was ever held.
    Rejected(RejectReason),
    /// Transport-level failure with no position held.
    Failed { cause: String },
}

impl AttemptOutcome {
    /// True for outcomes that count toward the circuit breaker's
    /// consecutive-failure count.
    #[must_use]
    pub fn counts_as_failure(&self) -> bool {
        matches!(
            self,
            AttemptOutcome::PartiallyUnwound { .. } | AttemptOutcome::Failed { .. }
        )
    }

    /// Stable label for metrics.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            AttemptOutcome::Filled => "filled",
            AttemptOutcome::PartiallyUnwound { .. } => "partially_unwound",
            AttemptOutcome::Rejected(_) => "rejected",
            AttemptOutcome::Failed { .. } => "failed",
        }
    }
}

/// Top-of-book prices captured at decision time, kept on the attempt
/// record for the recorder's benefit.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BookSnapshot {
    pub ab_bid: Price,
    pub ab_ask: Price,
    pub bc_bid: Price,
    pub bc_ask: Price,
    pub ac_bid: Price,
    pub ac_ask: Price,
}

impl BookSnapshot {
    /// Capture the six top-of-book prices from a quote view.
    #[must_use]
    pub fn from_view(view: &QuoteView) -> Self {
        Self {
            ab_bid: view.leg(Leg::Ab).bid(),
            ab_ask: view.leg(Leg::Ab).ask(),
            bc_bid: view.leg(Leg::Bc).bid(),
            bc_ask: view.leg(Leg::Bc).ask(),
            ac_bid: view.leg(Leg::Ac).bid(),
            ac_ask: view.leg(Leg::Ac).ask(),
        }
    }
}

/// One evaluation-to-outcome record.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    id: AttemptId,
    venue: String,
    triangle: Triangle,
    started_at: DateTime<Utc>,
    gross_edge: Option<Decimal>,
    net_edge: Option<Decimal>,
    threshold: Decimal,
    qty_base: Option<Qty>,
    book: Option<BookSnapshot>,
    fills: Vec<Fill>,
    realized_pnl: Option<Decimal>,
    latency_ms: Option<i64>,
    outcome: Option<AttemptOutcome>,
}

impl Attempt {
    /// Start a new attempt record for one evaluation cycle.
    #[must_use]
    pub fn begin(
        venue: impl Into<String>,
        triangle: Triangle,
        threshold: Decimal,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            venue: venue.into(),
            triangle,
            started_at,
            gross_edge: None,
            net_edge: None,
            threshold,
            qty_base: None,
            book: None,
            fills: Vec::new(),
            realized_pnl: None,
            latency_ms: None,
            outcome: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn venue(&self) -> &str {
        &self.venue
    }

    #[must_use]
    pub fn triangle(&self) -> &Triangle {
        &self.triangle
    }

    #[must_use]
    pub fn net_edge(&self) -> Option<Decimal> {
        self.net_edge
    }

    #[must_use]
    pub fn qty_base(&self) -> Option<Qty> {
        self.qty_base
    }

    #[must_use]
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    #[must_use]
    pub fn realized_pnl(&self) -> Option<Decimal> {
        self.realized_pnl
    }

    #[must_use]
    pub fn latency_ms(&self) -> Option<i64> {
        self.latency_ms
    }

    /// Terminal outcome, present once finalized.
    #[must_use]
    pub fn outcome(&self) -> Option<&AttemptOutcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.outcome.is_some()
    }

    /// Record the edge computation and the book it was computed from.
    pub fn note_evaluation(&mut self, gross: Decimal, net: Decimal, view: &QuoteView) {
        self.gross_edge = Some(gross);
        self.net_edge = Some(net);
        self.book = Some(BookSnapshot::from_view(view));
    }

    /// Record the sized base quantity.
    pub fn note_sizing(&mut self, qty_base: Qty) {
        self.qty_base = Some(qty_base);
    }

    /// Append an executed fill.
    pub fn push_fill(&mut self, fill: Fill) {
        self.fills.push(fill);
    }

    /// Record realized profit or loss in the quote currency.
    pub fn note_realized_pnl(&mut self, pnl: Decimal) {
        self.realized_pnl = Some(pnl);
    }

    /// Finalize with a terminal outcome. Must be called exactly once.
    pub fn finalize(&mut self, outcome: AttemptOutcome, now: DateTime<Utc>) {
        debug_assert!(self.outcome.is_none(), "attempt finalized twice");
        self.latency_ms = Some((now - self.started_at).num_milliseconds());
        self.outcome = Some(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Asset;
    use rust_decimal_macros::dec;

    fn triangle() -> Triangle {
        Triangle::new(
            "ETH/USDT",
            "ETH/BTC",
            "BTC/USDT",
            Asset::from("USDT"),
            Asset::from("ETH"),
            Asset::from("BTC"),
        )
        .unwrap()
    }

    #[test]
    fn finalize_sets_outcome_and_latency() {
        let start = Utc::now();
        let mut attempt = Attempt::begin("paper", triangle(), dec!(0.001), start);
        assert!(!attempt.is_finalized());

        attempt.finalize(
            AttemptOutcome::Rejected(RejectReason::Gate(SkipReason::BelowThreshold)),
            start + chrono::Duration::milliseconds(12),
        );

        assert!(attempt.is_finalized());
        assert_eq!(attempt.latency_ms(), Some(12));
        assert_eq!(attempt.outcome().unwrap().label(), "rejected");
    }

    #[test]
    fn failure_accounting() {
        assert!(!AttemptOutcome::Filled.counts_as_failure());
        assert!(!AttemptOutcome::Rejected(RejectReason::Leg1NoFill).counts_as_failure());
        assert!(AttemptOutcome::PartiallyUnwound {
            cause: "leg2 zero fill".into()
        }
        .counts_as_failure());
        assert!(AttemptOutcome::Failed {
            cause: "transport".into()
        }
        .counts_as_failure());
    }

    #[test]
    fn skip_reason_labels_are_stable() {
        assert_eq!(SkipReason::StaleQuote.to_string(), "stale_quote");
        assert_eq!(SkipReason::InventoryCap.to_string(), "inventory_cap");
        assert_eq!(RejectReason::Leg1NoFill.to_string(), "leg1_no_fill");
    }
}
