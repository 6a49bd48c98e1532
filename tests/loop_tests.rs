//! Loop-level accounting tests: a cycle's terminal outcome must reach
//! the circuit breaker and the metrics sink through the same path the
//! poll loop uses.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use arbit::app::{AppState, VenueLoop};
use arbit::config::{BreakerConfig, PaperConfig, RiskConfig, TriangleConfig, VenueConfig, VenueKind};
use arbit::domain::Asset;
use arbit::record::{MetricsSink, NullRecorder};
use arbit::testkit::{flat_view, profitable_view, PlaceScript, ScriptedVenue};

/// Metrics sink that remembers every skip reason it is handed.
#[derive(Default)]
struct CountingMetrics {
    skips: Mutex<Vec<String>>,
}

impl CountingMetrics {
    fn skips(&self) -> Vec<String> {
        self.skips.lock().unwrap().clone()
    }
}

impl MetricsSink for CountingMetrics {
    fn incr_attempt(&self, _venue: &str, _outcome: &str) {}

    fn incr_skip(&self, _venue: &str, reason: &str) {
        self.skips.lock().unwrap().push(reason.to_string());
    }

    fn observe_latency(&self, _venue: &str, _latency: Duration) {}

    fn add_realized_pnl(&self, _venue: &str, _pnl: Decimal) {}
}

fn venue_config() -> VenueConfig {
    VenueConfig {
        name: "scripted".to_string(),
        kind: VenueKind::Paper,
        poll_interval_ms: 10,
        order_timeout_ms: 200,
        balance_refresh_secs: 30,
        triangle: TriangleConfig {
            ab: "ETH/USDT".to_string(),
            bc: "ETH/BTC".to_string(),
            ac: "BTC/USDT".to_string(),
            quote: "USDT".to_string(),
            mid: "ETH".to_string(),
            cross: "BTC".to_string(),
        },
        risk: RiskConfig::default(),
        breaker: BreakerConfig::default(),
        paper: PaperConfig::default(),
    }
}

fn balances(usdt: Decimal) -> HashMap<Asset, Decimal> {
    HashMap::from([
        (Asset::from("USDT"), usdt),
        (Asset::from("ETH"), dec!(1)),
        (Asset::from("BTC"), dec!(1)),
    ])
}

fn venue_loop(
    venue: Arc<ScriptedVenue>,
    metrics: Arc<CountingMetrics>,
) -> VenueLoop {
    VenueLoop::new(
        venue_config(),
        venue,
        Arc::new(AppState::new()),
        Arc::new(NullRecorder),
        metrics,
    )
    .expect("venue loop")
}

#[tokio::test]
async fn partially_unwound_cycle_increments_breaker_streak() {
    let now = Utc::now();
    let venue = Arc::new(
        ScriptedVenue::new(profitable_view(now))
            .with_scripts(vec![
                PlaceScript::Fill,
                PlaceScript::NoFill,
                PlaceScript::Fill,
            ])
            .with_balances(balances(dec!(1000))),
    );
    let metrics = Arc::new(CountingMetrics::default());
    let mut venue_loop = venue_loop(venue.clone(), metrics);

    venue_loop.load_balances().await.expect("balances");
    assert_eq!(venue_loop.breaker_mut().consecutive_failures(), 0);

    venue_loop.run_once().await;

    // Leg 2 missed: the attempt unwound and the breaker streak moved.
    assert_eq!(venue.submitted_orders().len(), 3);
    assert_eq!(venue_loop.breaker_mut().consecutive_failures(), 1);
}

#[tokio::test]
async fn reservation_failure_counts_as_inventory_cap_skip() {
    let now = Utc::now();
    // Enough to pass the gate's cap check (none configured) but not
    // enough for the coordinator to reserve the $200 plan.
    let venue = Arc::new(
        ScriptedVenue::new(profitable_view(now)).with_balances(balances(dec!(100))),
    );
    let metrics = Arc::new(CountingMetrics::default());
    let mut venue_loop = venue_loop(venue.clone(), metrics.clone());

    venue_loop.load_balances().await.expect("balances");
    venue_loop.run_once().await;

    assert!(venue.submitted_orders().is_empty());
    assert_eq!(metrics.skips(), vec!["inventory_cap".to_string()]);
    // No position was held, so the breaker stays untouched.
    assert_eq!(venue_loop.breaker_mut().consecutive_failures(), 0);
}

#[tokio::test]
async fn gate_rejection_emits_exactly_one_skip() {
    let now = Utc::now();
    let venue =
        Arc::new(ScriptedVenue::new(flat_view(now)).with_balances(balances(dec!(1000))));
    let metrics = Arc::new(CountingMetrics::default());
    let mut venue_loop = venue_loop(venue, metrics.clone());

    venue_loop.load_balances().await.expect("balances");
    venue_loop.run_once().await;

    assert_eq!(metrics.skips(), vec!["below_threshold".to_string()]);
}
