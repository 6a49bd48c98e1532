//! Pre-execution risk gate.
//!
//! Validates one candidate attempt against the fixed check sequence:
//! quote freshness, circuit state, depth, minimum notional, edge
//! threshold, slippage headroom, inventory caps. The first failing check
//! short-circuits and becomes the reported skip reason.
//!
//! The gate never mutates anything. Inventory is only read here;
//! reservation happens in the coordinator, which re-validates atomically
//! via [`InventoryLedger::try_reserve`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::RiskConfig;
use crate::domain::{bps_to_fraction, Asset, Leg, Price, Qty, QuoteView, SkipReason, Triangle};
use crate::engine::breaker::CircuitState;
use crate::engine::ledger::InventoryLedger;

/// The finalized sizing an admitted attempt executes against.
#[derive(Debug, Clone)]
pub struct TradePlan {
    /// Base quantity shared across all three legs.
    pub qty_base: Qty,
    /// Expected cross-asset quantity out of leg 2 (`qty_base * bid_bc`).
    pub qty_cross: Qty,
    /// Decision-time prices the plan was sized against.
    pub ask_ab: Price,
    pub bid_bc: Price,
    pub bid_ac: Price,
    /// Quantities to reserve per asset before leg 1 is submitted.
    pub reservations: Vec<(Asset, Qty)>,
}

impl TradePlan {
    /// Build the plan for `qty_base` from decision-time quotes.
    ///
    /// Reservations cover the full intended exposure: quote currency
    /// spent on leg 1, the base acquired for leg 2, and the cross asset
    /// acquired for leg 3.
    #[must_use]
    pub fn new(triangle: &Triangle, view: &QuoteView, qty_base: Qty) -> Self {
        let ask_ab = view.leg(Leg::Ab).ask();
        let bid_bc = view.leg(Leg::Bc).bid();
        let bid_ac = view.leg(Leg::Ac).bid();
        let qty_cross = qty_base * bid_bc;
        let reservations = vec![
            (triangle.quote_asset().clone(), qty_base * ask_ab),
            (triangle.mid_asset().clone(), qty_base),
            (triangle.cross_asset().clone(), qty_cross),
        ];
        Self {
            qty_base,
            qty_cross,
            ask_ab,
            bid_bc,
            bid_ac,
            reservations,
        }
    }

    /// Intended notional per leg, in each leg's own quote currency.
    #[must_use]
    pub fn leg_notional(&self, leg: Leg) -> Price {
        match leg {
            Leg::Ab => self.qty_base * self.ask_ab,
            Leg::Bc => self.qty_base * self.bid_bc,
            Leg::Ac => self.qty_cross * self.bid_ac,
        }
    }
}

/// Outcome of the gate: admit with a finalized plan, or a typed skip.
#[derive(Debug, Clone)]
pub enum GateDecision {
    Admit(TradePlan),
    Reject(SkipReason),
}

impl GateDecision {
    #[must_use]
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admit(_))
    }

    #[must_use]
    pub fn rejection(&self) -> Option<SkipReason> {
        match self {
            GateDecision::Admit(_) => None,
            GateDecision::Reject(reason) => Some(*reason),
        }
    }
}

/// Everything the gate needs to judge one candidate attempt.
pub struct GateInput<'a> {
    /// Snapshot the edge and sizing were computed from.
    pub sizing_view: &'a QuoteView,
    /// Latest refresh, used for the slippage check and by execution.
    pub fresh_view: &'a QuoteView,
    pub net_edge: Decimal,
    pub qty_base: Qty,
    pub circuit: CircuitState,
    /// Venue-reported minimum notional per leg (AB, BC, AC order).
    pub min_notionals: [Decimal; 3],
    pub ledger: &'a InventoryLedger,
    pub now: DateTime<Utc>,
}

/// Sequential risk validation for one venue.
pub struct RiskGate {
    config: RiskConfig,
}

impl RiskGate {
    #[must_use]
    pub const fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Net-edge admission threshold as a fraction.
    #[must_use]
    pub fn threshold(&self) -> Decimal {
        bps_to_fraction(self.config.net_threshold_bps)
    }

    /// Run every check in order; the first failure is the decision.
    #[must_use]
    pub fn check(&self, triangle: &Triangle, input: &GateInput<'_>) -> GateDecision {
        if let Some(reason) = self.check_freshness(input) {
            return GateDecision::Reject(reason);
        }
        if matches!(input.circuit, CircuitState::Open { .. }) {
            return GateDecision::Reject(SkipReason::CircuitOpen);
        }
        if input.qty_base.is_zero() {
            return GateDecision::Reject(SkipReason::InsufficientDepth);
        }

        let plan = TradePlan::new(triangle, input.sizing_view, input.qty_base);

        if let Some(reason) = Self::check_min_notional(&plan, &input.min_notionals) {
            return GateDecision::Reject(reason);
        }
        if input.net_edge < self.threshold() {
            return GateDecision::Reject(SkipReason::BelowThreshold);
        }
        if let Some(reason) = self.check_slippage(input) {
            return GateDecision::Reject(reason);
        }
        if let Some(reason) = self.check_inventory_caps(&plan, input.ledger) {
            return GateDecision::Reject(reason);
        }

        GateDecision::Admit(plan)
    }

    fn check_freshness(&self, input: &GateInput<'_>) -> Option<SkipReason> {
        let max_age = self.config.max_quote_age();
        let stalest = input
            .sizing_view
            .max_age(input.now)
            .max(input.fresh_view.max_age(input.now));
        (stalest > max_age).then_some(SkipReason::StaleQuote)
    }

    fn check_min_notional(plan: &TradePlan, min_notionals: &[Decimal; 3]) -> Option<SkipReason> {
        Leg::ALL
            .iter()
            .zip(min_notionals.iter())
            .any(|(leg, min)| plan.leg_notional(*leg) < *min)
            .then_some(SkipReason::BelowMinNotional)
    }

    fn check_slippage(&self, input: &GateInput<'_>) -> Option<SkipReason> {
        let bound = self.config.max_slippage_bps;
        let pairs = [
            (
                input.sizing_view.leg(Leg::Ab).ask(),
                input.fresh_view.leg(Leg::Ab).ask(),
            ),
            (
                input.sizing_view.leg(Leg::Bc).bid(),
                input.fresh_view.leg(Leg::Bc).bid(),
            ),
            (
                input.sizing_view.leg(Leg::Ac).bid(),
                input.fresh_view.leg(Leg::Ac).bid(),
            ),
        ];
        for (sized, fresh) in pairs {
            if sized.is_zero() {
                return Some(SkipReason::SlippageExceeded);
            }
            let drift_bps = ((fresh - sized).abs() / sized) * Decimal::from(10_000);
            if drift_bps > bound {
                return Some(SkipReason::SlippageExceeded);
            }
        }
        None
    }

    fn check_inventory_caps(
        &self,
        plan: &TradePlan,
        ledger: &InventoryLedger,
    ) -> Option<SkipReason> {
        for (asset, qty) in &plan.reservations {
            if let Some(cap) = self.config.inventory_caps.get(asset.as_str()) {
                if ledger.reserved_of(asset) + *qty > *cap {
                    return Some(SkipReason::InventoryCap);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    use crate::domain::Quote;

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

    fn view(now: DateTime<Utc>) -> QuoteView {
        QuoteView::new(
            Quote::new(dec!(1999), dec!(2000), dec!(5), dec!(5), now),
            Quote::new(dec!(0.05), dec!(0.0501), dec!(5), dec!(5), now),
            Quote::new(dec!(60000), dec!(60010), dec!(5), dec!(5), now),
            now,
        )
    }

    fn gate() -> RiskGate {
        RiskGate::new(RiskConfig::default())
    }

    fn input<'a>(
        sizing: &'a QuoteView,
        fresh: &'a QuoteView,
        ledger: &'a InventoryLedger,
        now: DateTime<Utc>,
    ) -> GateInput<'a> {
        GateInput {
            sizing_view: sizing,
            fresh_view: fresh,
            net_edge: dec!(0.4985),
            qty_base: dec!(0.1),
            circuit: CircuitState::Closed,
            min_notionals: [dec!(5), dec!(0.0001), dec!(5)],
            ledger,
            now,
        }
    }

    #[test]
    fn admits_when_all_checks_pass() {
        let now = Utc::now();
        let v = view(now);
        let ledger = InventoryLedger::new();
        let decision = gate().check(&triangle(), &input(&v, &v, &ledger, now));

        let GateDecision::Admit(plan) = decision else {
            panic!("expected admission");
        };
        assert_eq!(plan.qty_base, dec!(0.1));
        assert_eq!(plan.qty_cross, dec!(0.005));
        assert_eq!(plan.reservations.len(), 3);
    }

    #[test]
    fn stale_quote_rejected_first() {
        let now = Utc::now();
        let stale = view(now - chrono::Duration::seconds(10));
        let ledger = InventoryLedger::new();
        // Even with the circuit open, staleness is reported first.
        let mut inp = input(&stale, &stale, &ledger, now);
        inp.circuit = CircuitState::Open {
            since: std::time::Instant::now(),
        };
        let decision = gate().check(&triangle(), &inp);
        assert_eq!(decision.rejection(), Some(SkipReason::StaleQuote));
    }

    #[test]
    fn open_circuit_rejects() {
        let now = Utc::now();
        let v = view(now);
        let ledger = InventoryLedger::new();
        let mut inp = input(&v, &v, &ledger, now);
        inp.circuit = CircuitState::Open {
            since: std::time::Instant::now(),
        };
        assert_eq!(
            gate().check(&triangle(), &inp).rejection(),
            Some(SkipReason::CircuitOpen)
        );
    }

    #[test]
    fn zero_qty_is_insufficient_depth_not_min_notional() {
        let now = Utc::now();
        let v = view(now);
        let ledger = InventoryLedger::new();
        let mut inp = input(&v, &v, &ledger, now);
        inp.qty_base = Qty::ZERO;
        assert_eq!(
            gate().check(&triangle(), &inp).rejection(),
            Some(SkipReason::InsufficientDepth)
        );
    }

    #[test]
    fn tiny_size_fails_min_notional() {
        let now = Utc::now();
        let v = view(now);
        let ledger = InventoryLedger::new();
        let mut inp = input(&v, &v, &ledger, now);
        inp.qty_base = dec!(0.001); // $2 on leg AB, below the $5 minimum
        assert_eq!(
            gate().check(&triangle(), &inp).rejection(),
            Some(SkipReason::BelowMinNotional)
        );
    }

    #[test]
    fn edge_below_threshold_rejects() {
        let now = Utc::now();
        let v = view(now);
        let ledger = InventoryLedger::new();
        let mut inp = input(&v, &v, &ledger, now);
        inp.net_edge = dec!(0.0005); // 5 bps, threshold is 10
        assert_eq!(
            gate().check(&triangle(), &inp).rejection(),
            Some(SkipReason::BelowThreshold)
        );
    }

    #[test]
    fn admitted_implies_edge_at_least_threshold() {
        let now = Utc::now();
        let v = view(now);
        let ledger = InventoryLedger::new();
        let g = gate();
        for bps in [0i64, 5, 9, 10, 11, 100, 4985] {
            let mut inp = input(&v, &v, &ledger, now);
            inp.net_edge = Decimal::from(bps) / Decimal::from(10_000);
            let decision = g.check(&triangle(), &inp);
            if decision.is_admitted() {
                assert!(inp.net_edge >= g.threshold());
            }
        }
    }

    #[test]
    fn drifted_quote_rejects_on_slippage() {
        let now = Utc::now();
        let sizing = view(now);
        // Ask moved 2000 -> 2010: 50 bps, over the 5 bps bound.
        let fresh = QuoteView::new(
            Quote::new(dec!(1999), dec!(2010), dec!(5), dec!(5), now),
            *sizing.leg(Leg::Bc),
            *sizing.leg(Leg::Ac),
            now,
        );
        let ledger = InventoryLedger::new();
        let inp = input(&sizing, &fresh, &ledger, now);
        assert_eq!(
            gate().check(&triangle(), &inp).rejection(),
            Some(SkipReason::SlippageExceeded)
        );
    }

    #[test]
    fn inventory_cap_rejects_when_reserved_plus_new_exceeds() {
        let now = Utc::now();
        let v = view(now);
        let ledger = InventoryLedger::new();
        ledger.set_balances(HashMap::from([(Asset::from("USDT"), dec!(10000))]));
        assert!(ledger.try_reserve(
            crate::domain::AttemptId::new(),
            &[(Asset::from("USDT"), dec!(150))]
        ));

        let mut config = RiskConfig::default();
        config
            .inventory_caps
            .insert("USDT".to_string(), dec!(300));
        let gate = RiskGate::new(config);

        // Plan reserves 0.1 * 2000 = $200 USDT; 150 + 200 > 300.
        let inp = input(&v, &v, &ledger, now);
        assert_eq!(
            gate.check(&triangle(), &inp).rejection(),
            Some(SkipReason::InventoryCap)
        );
    }
}
