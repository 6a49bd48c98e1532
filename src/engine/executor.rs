//! Three-leg execution coordination.
//!
//! Drives one admitted attempt through its state machine: reserve
//! inventory, submit the three IOC legs in order, and recover from
//! partial outcomes. Terminal outcomes are `Filled`, `PartiallyUnwound`,
//! `Rejected`, and `Failed`.
//!
//! Retry policy is asymmetric on purpose: a transport failure on leg 1 is
//! retried once after a fresh edge re-check because no position is held
//! yet; once leg 1 has filled, later legs are never retried — the only
//! moves are proceed or flatten. Every attempt writes the ledger and
//! reaches the recorder exactly once, keyed by its attempt id.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::domain::{
    Asset, Attempt, AttemptOutcome, Fill, Leg, LegOrder, RejectReason, Side, SkipReason, Triangle,
};
use crate::engine::edge;
use crate::engine::ledger::InventoryLedger;
use crate::engine::risk::TradePlan;
use crate::error::ExecutionError;
use crate::exchange::traits::VenueAdapter;

/// Coordinates the three leg placements for one venue.
pub struct ExecutionCoordinator {
    adapter: Arc<dyn VenueAdapter>,
    ledger: Arc<InventoryLedger>,
    order_timeout: Duration,
    /// Net-edge threshold used for the pre-position retry re-check.
    threshold: Decimal,
}

impl ExecutionCoordinator {
    #[must_use]
    pub fn new(
        adapter: Arc<dyn VenueAdapter>,
        ledger: Arc<InventoryLedger>,
        order_timeout: Duration,
        threshold: Decimal,
    ) -> Self {
        Self {
            adapter,
            ledger,
            order_timeout,
            threshold,
        }
    }

    /// Execute an admitted plan, finalizing `attempt` with the terminal
    /// outcome. Never returns an error: every failure mode is an outcome.
    pub async fn execute(&self, triangle: &Triangle, plan: &TradePlan, attempt: &mut Attempt) {
        let id = attempt.id();

        // Re-validate inventory atomically with reservation; the gate's
        // read-only check may have raced a concurrent balance change.
        if !self.ledger.try_reserve(id, &plan.reservations) {
            attempt.finalize(
                AttemptOutcome::Rejected(RejectReason::Gate(SkipReason::InventoryCap)),
                Utc::now(),
            );
            return;
        }

        // Leg 1: buy B with A. The only leg eligible for a retry.
        let order1 = LegOrder::ioc_market(
            triangle.symbol(Leg::Ab),
            Side::Buy,
            plan.qty_base,
            Leg::Ab,
            id,
        );
        let fill1 = match self.place_leg1(triangle, &order1).await {
            Ok(fill) => fill,
            Err(cause) => {
                self.ledger.release(id);
                attempt.finalize(AttemptOutcome::Failed { cause }, Utc::now());
                return;
            }
        };
        if fill1.is_empty() {
            self.ledger.release(id);
            attempt.finalize(
                AttemptOutcome::Rejected(RejectReason::Leg1NoFill),
                Utc::now(),
            );
            return;
        }
        debug!(leg = %Leg::Ab, qty = %fill1.qty, price = %fill1.price, "leg filled");
        attempt.push_fill(fill1.clone());

        // Leg 2: sell the B we actually acquired, not the planned size.
        let order2 = LegOrder::ioc_market(
            triangle.symbol(Leg::Bc),
            Side::Sell,
            fill1.qty,
            Leg::Bc,
            id,
        );
        let fill2 = match self.place_leg(&order2).await {
            Ok(fill) if !fill.is_empty() => fill,
            Ok(_) => {
                let flatten = vec![self.reverse_leg1(triangle, id, fill1.qty)];
                self.unwind(triangle, attempt, flatten, "leg2 zero fill".into())
                    .await;
                return;
            }
            Err(err) => {
                let flatten = vec![self.reverse_leg1(triangle, id, fill1.qty)];
                self.unwind(triangle, attempt, flatten, format!("leg2: {err}"))
                    .await;
                return;
            }
        };
        debug!(leg = %Leg::Bc, qty = %fill2.qty, price = %fill2.price, "leg filled");
        attempt.push_fill(fill2.clone());

        // Leg 3: sell the C actually produced by leg 2.
        let qty_cross = fill2.qty * fill2.price;
        let order3 = LegOrder::ioc_market(
            triangle.symbol(Leg::Ac),
            Side::Sell,
            qty_cross,
            Leg::Ac,
            id,
        );
        let fill3 = match self.place_leg(&order3).await {
            Ok(fill) if !fill.is_empty() => fill,
            Ok(_) => {
                let flatten = self.reverse_to_quote(triangle, id, &fill1, &fill2);
                self.unwind(triangle, attempt, flatten, "leg3 zero fill".into())
                    .await;
                return;
            }
            Err(err) => {
                let flatten = self.reverse_to_quote(triangle, id, &fill1, &fill2);
                self.unwind(triangle, attempt, flatten, format!("leg3: {err}"))
                    .await;
                return;
            }
        };
        debug!(leg = %Leg::Ac, qty = %fill3.qty, price = %fill3.price, "leg filled");
        attempt.push_fill(fill3);

        self.finish(triangle, attempt, AttemptOutcome::Filled);
    }

    /// Submit leg 1 with the single pre-position retry.
    async fn place_leg1(
        &self,
        triangle: &Triangle,
        order: &LegOrder,
    ) -> Result<Fill, String> {
        match self.place_leg(order).await {
            Ok(fill) => Ok(fill),
            Err(err) if err.is_transport() => {
                if !self.edge_still_present(triangle).await {
                    return Err(format!("leg1 transport, edge gone on re-check: {err}"));
                }
                warn!(error = %err, "leg1 transport error, retrying once");
                self.place_leg(order)
                    .await
                    .map_err(|retry| format!("leg1 retry: {retry}"))
            }
            Err(err) => Err(format!("leg1: {err}")),
        }
    }

    /// Submit one order with the enforced timeout. A timed-out submission
    /// is cancelled best-effort and treated as a zero fill.
    async fn place_leg(&self, order: &LegOrder) -> Result<Fill, ExecutionError> {
        match tokio::time::timeout(self.order_timeout, self.adapter.place_order(order)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(leg = %order.leg, client_id = %order.client_id, "order timed out");
                let cancel = self.adapter.cancel_order(&order.client_id);
                if let Ok(Err(e)) = tokio::time::timeout(self.order_timeout, cancel).await {
                    warn!(error = %e, "cancel after timeout failed");
                }
                Ok(Fill::none(order.leg, order.side, order.attempt_id))
            }
        }
    }

    /// Fresh-quote re-check before the leg-1 retry.
    async fn edge_still_present(&self, triangle: &Triangle) -> bool {
        match self.adapter.quotes(triangle).await {
            Ok(view) => edge::net_edge_of_view(&view, &self.adapter.fees()) >= self.threshold,
            Err(e) => {
                warn!(error = %e, "quote re-check failed");
                false
            }
        }
    }

    fn reverse_leg1(&self, triangle: &Triangle, id: crate::domain::AttemptId, qty: Decimal) -> LegOrder {
        LegOrder::ioc_market(triangle.symbol(Leg::Ab), Side::Sell, qty, Leg::Ab, id)
    }

    /// Flatten chain after a leg-3 miss: buy the B back on BC, then sell
    /// it for A on AB, returning the position to the quote currency.
    fn reverse_to_quote(
        &self,
        triangle: &Triangle,
        id: crate::domain::AttemptId,
        fill1: &Fill,
        fill2: &Fill,
    ) -> Vec<LegOrder> {
        let qty_base = fill2.qty.min(fill1.qty);
        vec![
            LegOrder::ioc_market(triangle.symbol(Leg::Bc), Side::Buy, qty_base, Leg::Bc, id),
            LegOrder::ioc_market(triangle.symbol(Leg::Ab), Side::Sell, qty_base, Leg::Ab, id),
        ]
    }

    /// Submit flattening orders best-effort (no retries, a miss is
    /// logged) and finalize as partially unwound.
    async fn unwind(
        &self,
        triangle: &Triangle,
        attempt: &mut Attempt,
        flatten: Vec<LegOrder>,
        cause: String,
    ) {
        warn!(%cause, "unwinding open position");
        for order in flatten {
            match self.place_leg(&order).await {
                Ok(fill) if !fill.is_empty() => attempt.push_fill(fill),
                Ok(_) => warn!(leg = %order.leg, side = %order.side, "flatten order did not fill"),
                Err(e) => warn!(error = %e, leg = %order.leg, "flatten order failed"),
            }
        }
        self.finish(triangle, attempt, AttemptOutcome::PartiallyUnwound { cause });
    }

    /// Settle the ledger and finalize the attempt. Called exactly once
    /// per attempt that reserved inventory.
    fn finish(&self, triangle: &Triangle, attempt: &mut Attempt, outcome: AttemptOutcome) {
        let pnl = realized_pnl(attempt.fills());
        attempt.note_realized_pnl(pnl);
        let deltas = balance_deltas(triangle, attempt.fills());
        self.ledger.settle(attempt.id(), &deltas);
        attempt.finalize(outcome, Utc::now());
    }
}

/// Realized PnL in the quote currency: A received minus A spent minus
/// all fees. Legs priced in A (AB and AC) move A by their notional; the
/// BC leg moves only B and C.
#[must_use]
pub fn realized_pnl(fills: &[Fill]) -> Decimal {
    fills
        .iter()
        .map(|fill| {
            let flow = match fill.leg {
                Leg::Ab | Leg::Ac => match fill.side {
                    Side::Buy => -fill.notional(),
                    Side::Sell => fill.notional(),
                },
                Leg::Bc => Decimal::ZERO,
            };
            flow - fill.fee
        })
        .sum()
}

/// Per-asset balance deltas implied by a set of fills.
#[must_use]
pub fn balance_deltas(triangle: &Triangle, fills: &[Fill]) -> Vec<(Asset, Decimal)> {
    let mut deltas: HashMap<Asset, Decimal> = HashMap::new();
    let add = |deltas: &mut HashMap<Asset, Decimal>, asset: &Asset, amount: Decimal| {
        *deltas.entry(asset.clone()).or_insert(Decimal::ZERO) += amount;
    };

    for fill in fills {
        let sign = match fill.side {
            Side::Buy => Decimal::ONE,
            Side::Sell => Decimal::NEGATIVE_ONE,
        };
        match fill.leg {
            // AB: base is B, quoted in A.
            Leg::Ab => {
                add(&mut deltas, triangle.mid_asset(), sign * fill.qty);
                add(&mut deltas, triangle.quote_asset(), -sign * fill.notional());
            }
            // BC: base is B, quoted in C.
            Leg::Bc => {
                add(&mut deltas, triangle.mid_asset(), sign * fill.qty);
                add(&mut deltas, triangle.cross_asset(), -sign * fill.notional());
            }
            // AC: base is C, quoted in A.
            Leg::Ac => {
                add(&mut deltas, triangle.cross_asset(), sign * fill.qty);
                add(&mut deltas, triangle.quote_asset(), -sign * fill.notional());
            }
        }
        // Fees settle in A.
        add(&mut deltas, triangle.quote_asset(), -fill.fee);
    }

    deltas.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::domain::{AttemptId, OrderId};

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

    fn fill(leg: Leg, side: Side, qty: Decimal, price: Decimal, fee: Decimal) -> Fill {
        Fill {
            leg,
            side,
            order_id: OrderId::new("t"),
            qty,
            price,
            fee,
            attempt_id: AttemptId::new(),
        }
    }

    #[test]
    fn pnl_of_completed_cycle() {
        let fills = vec![
            fill(Leg::Ab, Side::Buy, dec!(0.1), dec!(2000), dec!(0.2)),
            fill(Leg::Bc, Side::Sell, dec!(0.1), dec!(0.05), dec!(0.2)),
            fill(Leg::Ac, Side::Sell, dec!(0.005), dec!(60000), dec!(0.3)),
        ];
        // in 300, out 200, fees 0.7
        assert_eq!(realized_pnl(&fills), dec!(99.3));
    }

    #[test]
    fn pnl_of_round_trip_miss_is_spread_plus_fees() {
        let fills = vec![
            fill(Leg::Ab, Side::Buy, dec!(0.1), dec!(2000), dec!(0.2)),
            fill(Leg::Ab, Side::Sell, dec!(0.1), dec!(1999), dec!(0.2)),
        ];
        // -200 + 199.9 - fees 0.4
        assert_eq!(realized_pnl(&fills), dec!(-0.5));
    }

    #[test]
    fn balance_deltas_net_out_intermediate_assets() {
        let tri = triangle();
        let fills = vec![
            fill(Leg::Ab, Side::Buy, dec!(0.1), dec!(2000), dec!(0.2)),
            fill(Leg::Bc, Side::Sell, dec!(0.1), dec!(0.05), dec!(0.2)),
            fill(Leg::Ac, Side::Sell, dec!(0.005), dec!(60000), dec!(0.3)),
        ];
        let deltas: HashMap<_, _> = balance_deltas(&tri, &fills).into_iter().collect();

        assert_eq!(deltas[&Asset::from("ETH")], dec!(0));
        assert_eq!(deltas[&Asset::from("BTC")], dec!(0.000));
        // 300 - 200 - 0.7 in USDT
        assert_eq!(deltas[&Asset::from("USDT")], dec!(99.3));
    }
}
