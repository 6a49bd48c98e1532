//! Per-venue decision loop.
//!
//! Each venue runs one independent loop: snapshot quotes, compute the
//! edge, size, gate, and (when admitted) execute. At most one attempt is
//! ever in flight per venue — the loop awaits the coordinator before the
//! next evaluation, so concurrent unhedged positions on one venue cannot
//! exist. Loops across venues share nothing but the kill switch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::app::state::AppState;
use crate::config::VenueConfig;
use crate::domain::{
    Asset, Attempt, AttemptOutcome, Leg, QuoteView, RejectReason, SkipReason, Triangle,
};
use crate::engine::breaker::CircuitBreaker;
use crate::engine::executor::ExecutionCoordinator;
use crate::engine::ledger::InventoryLedger;
use crate::engine::risk::{GateDecision, GateInput, RiskGate};
use crate::engine::{edge, sizing};
use crate::error::Result;
use crate::exchange::traits::VenueAdapter;
use crate::record::{AttemptRecorder, MetricsSink};

/// One venue's evaluate-then-execute loop.
pub struct VenueLoop {
    config: VenueConfig,
    triangle: Triangle,
    adapter: Arc<dyn VenueAdapter>,
    state: Arc<AppState>,
    ledger: Arc<InventoryLedger>,
    gate: RiskGate,
    coordinator: ExecutionCoordinator,
    breaker: CircuitBreaker,
    recorder: Arc<dyn AttemptRecorder>,
    metrics: Arc<dyn MetricsSink>,
}

impl VenueLoop {
    pub fn new(
        config: VenueConfig,
        adapter: Arc<dyn VenueAdapter>,
        state: Arc<AppState>,
        recorder: Arc<dyn AttemptRecorder>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        let triangle = config.triangle.to_triangle()?;
        let ledger = Arc::new(InventoryLedger::new());
        let gate = RiskGate::new(config.risk.clone());
        let coordinator = ExecutionCoordinator::new(
            adapter.clone(),
            ledger.clone(),
            config.order_timeout(),
            gate.threshold(),
        );
        let breaker = CircuitBreaker::new(config.breaker.clone());
        Ok(Self {
            config,
            triangle,
            adapter,
            state,
            ledger,
            gate,
            coordinator,
            breaker,
            recorder,
            metrics,
        })
    }

    /// Run until the kill switch trips or a fatal error halts the venue.
    pub async fn run(mut self) -> Result<()> {
        info!(
            venue = %self.config.name,
            triangle = %self.triangle,
            "venue loop starting"
        );

        // Initial balance load is required; a venue we cannot read
        // balances from is not safe to trade on.
        if let Err(e) = self.refresh_balances().await {
            error!(venue = %self.config.name, error = %e, "initial balance load failed");
            self.breaker.latch_open(Instant::now());
            return Err(e);
        }

        let mut last_refresh = Instant::now();
        while !self.state.shutdown_requested() {
            if last_refresh.elapsed() >= self.config.balance_refresh() {
                // Refresh failures mid-run are non-fatal; the ledger
                // keeps its last known balances.
                if let Err(e) = self.refresh_balances().await {
                    warn!(venue = %self.config.name, error = %e, "balance refresh failed");
                }
                last_refresh = Instant::now();
            }

            self.cycle().await;
            tokio::time::sleep(self.config.poll_interval()).await;
        }

        info!(
            venue = %self.config.name,
            balances = %self.balances_brief(),
            "venue loop stopped"
        );
        Ok(())
    }

    /// One full evaluation cycle, always producing a finalized attempt.
    async fn cycle(&mut self) {
        let venue = self.config.name.clone();
        let mut attempt = Attempt::begin(
            venue.clone(),
            self.triangle.clone(),
            self.gate.threshold(),
            Utc::now(),
        );

        let sizing_view = match self.adapter.quotes(&self.triangle).await {
            Ok(view) => view,
            Err(e) => {
                warn!(venue = %venue, error = %e, "quote snapshot failed");
                self.finish_skip(&mut attempt, SkipReason::StaleQuote);
                return;
            }
        };

        // The edge math divides by ask AB; a venue serving non-positive
        // decision prices is as unusable as an empty book.
        if !decision_prices_positive(&sizing_view) {
            warn!(venue = %venue, "non-positive decision price in quote snapshot");
            self.finish_skip(&mut attempt, SkipReason::InsufficientDepth);
            return;
        }

        let fees = self.adapter.fees();
        let gross = edge::gross_edge_of_view(&sizing_view);
        let net = edge::net_edge_of_view(&sizing_view, &fees);
        attempt.note_evaluation(gross, net, &sizing_view);
        debug!(venue = %venue, gross = %gross, net = %net, "edge computed");

        let qty_base = sizing::size_base(&sizing_view, self.config.risk.notional_cap);
        attempt.note_sizing(qty_base);

        // Refresh once more so the gate can measure drift between the
        // sizing snapshot and the book we are about to trade against.
        let fresh_view = match self.adapter.quotes(&self.triangle).await {
            Ok(view) => view,
            Err(e) => {
                warn!(venue = %venue, error = %e, "quote refresh failed");
                self.finish_skip(&mut attempt, SkipReason::StaleQuote);
                return;
            }
        };

        let circuit = self.breaker.state(Instant::now());
        let input = GateInput {
            sizing_view: &sizing_view,
            fresh_view: &fresh_view,
            net_edge: net,
            qty_base,
            circuit,
            min_notionals: [
                self.adapter.min_notional(self.triangle.symbol(Leg::Ab)),
                self.adapter.min_notional(self.triangle.symbol(Leg::Bc)),
                self.adapter.min_notional(self.triangle.symbol(Leg::Ac)),
            ],
            ledger: &self.ledger,
            now: Utc::now(),
        };

        match self.gate.check(&self.triangle, &input) {
            GateDecision::Reject(reason) => {
                debug!(venue = %venue, %reason, "cycle skipped");
                self.finish_skip(&mut attempt, reason);
            }
            GateDecision::Admit(plan) => {
                info!(
                    venue = %venue,
                    net = %net,
                    qty_base = %plan.qty_base,
                    "edge admitted, executing"
                );
                self.coordinator
                    .execute(&self.triangle, &plan, &mut attempt)
                    .await;
                self.account(&attempt);
            }
        }
    }

    /// Finalize a gate rejection and hand it to the sinks.
    fn finish_skip(&mut self, attempt: &mut Attempt, reason: SkipReason) {
        attempt.finalize(
            AttemptOutcome::Rejected(RejectReason::Gate(reason)),
            Utc::now(),
        );
        self.account(attempt);
    }

    /// Feed a finalized attempt to the breaker, metrics, and recorder.
    fn account(&mut self, attempt: &Attempt) {
        let Some(outcome) = attempt.outcome() else {
            error!(attempt = %attempt.id(), "attempt left unfinalized");
            return;
        };

        // Gate rejections count as skips no matter which side raised
        // them: the gate itself or the coordinator's reservation
        // re-validation.
        if let AttemptOutcome::Rejected(RejectReason::Gate(reason)) = outcome {
            self.metrics.incr_skip(&self.config.name, &reason.to_string());
        }

        self.breaker.record_outcome(outcome, Instant::now());
        self.metrics.incr_attempt(&self.config.name, outcome.label());
        if let Some(ms) = attempt.latency_ms() {
            self.metrics
                .observe_latency(&self.config.name, Duration::from_millis(ms.max(0) as u64));
        }
        if let Some(pnl) = attempt.realized_pnl() {
            self.metrics.add_realized_pnl(&self.config.name, pnl);
        }
        for fill in attempt.fills() {
            self.recorder.record_fill(fill);
        }
        self.recorder.record_attempt(attempt);
    }

    async fn refresh_balances(&self) -> Result<()> {
        let balances = self.adapter.balances().await?;
        info!(venue = %self.config.name, balances = %brief(&balances), "balances loaded");
        self.ledger.set_balances(balances);
        Ok(())
    }

    fn balances_brief(&self) -> String {
        let assets = [
            self.triangle.quote_asset().clone(),
            self.triangle.mid_asset().clone(),
            self.triangle.cross_asset().clone(),
        ];
        assets
            .iter()
            .map(|a| format!("{a}={}", self.ledger.available_of(a)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Expose the breaker for integration tests.
    #[cfg(any(test, feature = "testkit"))]
    pub fn breaker_mut(&mut self) -> &mut CircuitBreaker {
        &mut self.breaker
    }

    /// Seed the ledger from the adapter, as `run` does on startup.
    #[cfg(any(test, feature = "testkit"))]
    pub async fn load_balances(&self) -> Result<()> {
        self.refresh_balances().await
    }

    /// Drive a single evaluation cycle without entering the poll loop.
    #[cfg(any(test, feature = "testkit"))]
    pub async fn run_once(&mut self) {
        self.cycle().await;
    }
}

/// True when every price the decision path divides by or multiplies
/// with is positive.
fn decision_prices_positive(view: &QuoteView) -> bool {
    view.leg(Leg::Ab).ask() > Decimal::ZERO
        && view.leg(Leg::Bc).bid() > Decimal::ZERO
        && view.leg(Leg::Ac).bid() > Decimal::ZERO
}

fn brief(balances: &HashMap<Asset, Decimal>) -> String {
    let mut parts: Vec<String> = balances
        .iter()
        .map(|(asset, total)| format!("{asset}={total}"))
        .collect();
    parts.sort();
    parts.join(" ")
}
