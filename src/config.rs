//! Application configuration loading and validation.
//!
//! Configuration is loaded from a TOML file. Each `[[venues]]` table
//! describes one independent decision loop: the triangle it watches, its
//! risk limits, and its circuit breaker tuning.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};

use crate::domain::{Asset, Triangle};
use crate::error::{ConfigError, Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Dry-run mode: route orders through the in-process paper venue.
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub venues: Vec<VenueConfig>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Supported venue adapter kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    #[default]
    Paper,
}

/// Configuration for one venue's decision loop.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    pub name: String,
    #[serde(default)]
    pub kind: VenueKind,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_order_timeout_ms")]
    pub order_timeout_ms: u64,
    #[serde(default = "default_balance_refresh_secs")]
    pub balance_refresh_secs: u64,
    pub triangle: TriangleConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub paper: PaperConfig,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_order_timeout_ms() -> u64 {
    2_000
}

fn default_balance_refresh_secs() -> u64 {
    30
}

impl VenueConfig {
    /// Poll interval between evaluation cycles.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Enforced timeout for each order placement/cancellation call.
    #[must_use]
    pub fn order_timeout(&self) -> Duration {
        Duration::from_millis(self.order_timeout_ms)
    }

    /// How often venue balances are re-pulled into the ledger.
    #[must_use]
    pub fn balance_refresh(&self) -> Duration {
        Duration::from_secs(self.balance_refresh_secs)
    }
}

/// The three pair symbols and three asset codes forming the cycle.
#[derive(Debug, Clone, Deserialize)]
pub struct TriangleConfig {
    pub ab: String,
    pub bc: String,
    pub ac: String,
    pub quote: String,
    pub mid: String,
    pub cross: String,
}

impl TriangleConfig {
    /// Build the validated domain triangle.
    pub fn to_triangle(&self) -> std::result::Result<Triangle, ConfigError> {
        Triangle::new(
            self.ab.clone(),
            self.bc.clone(),
            self.ac.clone(),
            Asset::new(self.quote.clone()),
            Asset::new(self.mid.clone()),
            Asset::new(self.cross.clone()),
        )
    }
}

/// Risk limits for one venue. Thresholds are expressed in basis points.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Minimum net edge to act on, in bps (10 = 0.1%).
    #[serde(default = "default_net_threshold_bps")]
    pub net_threshold_bps: Decimal,
    /// Maximum notional per attempt, in the quote currency of leg AB.
    #[serde(default = "default_notional_cap")]
    pub notional_cap: Decimal,
    /// Reject quotes older than this.
    #[serde(default = "default_max_quote_age_ms")]
    pub max_quote_age_ms: u64,
    /// Maximum adverse drift between sizing and execution quotes, in bps.
    #[serde(default = "default_max_slippage_bps")]
    pub max_slippage_bps: Decimal,
    /// Per-asset caps on reserved exposure. Assets not listed are uncapped.
    #[serde(default)]
    pub inventory_caps: HashMap<String, Decimal>,
}

fn default_net_threshold_bps() -> Decimal {
    Decimal::from(10)
}

fn default_notional_cap() -> Decimal {
    Decimal::from(200)
}

fn default_max_quote_age_ms() -> u64 {
    1_500
}

fn default_max_slippage_bps() -> Decimal {
    Decimal::from(5)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            net_threshold_bps: default_net_threshold_bps(),
            notional_cap: default_notional_cap(),
            max_quote_age_ms: default_max_quote_age_ms(),
            max_slippage_bps: default_max_slippage_bps(),
            inventory_caps: HashMap::new(),
        }
    }
}

impl RiskConfig {
    /// Maximum acceptable quote age.
    #[must_use]
    pub fn max_quote_age(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.max_quote_age_ms as i64)
    }
}

/// Circuit breaker tuning for one venue.
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    /// Consecutive failures before the breaker opens.
    #[serde(default = "default_consecutive_failures")]
    pub consecutive_failures: u32,
    /// How long the breaker stays open before allowing a trial attempt.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// A failure streak older than this window is forgotten.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_consecutive_failures() -> u32 {
    3
}

fn default_cooldown_secs() -> u64 {
    60
}

fn default_window_secs() -> u64 {
    300
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            consecutive_failures: default_consecutive_failures(),
            cooldown_secs: default_cooldown_secs(),
            window_secs: default_window_secs(),
        }
    }
}

impl BreakerConfig {
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Seed data for the in-process paper venue used in dry-run mode.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    /// Taker fee charged per leg (fraction, e.g. 0.001).
    #[serde(default = "default_taker_fee")]
    pub taker_fee: Decimal,
    /// Minimum notional per symbol; symbols not listed use `min_notional`.
    #[serde(default)]
    pub min_notionals: HashMap<String, Decimal>,
    /// Fallback minimum notional.
    #[serde(default = "default_min_notional")]
    pub min_notional: Decimal,
    /// Starting balances per asset.
    #[serde(default)]
    pub balances: HashMap<String, Decimal>,
    /// Static top-of-book used to answer quote requests.
    pub book: Option<PaperBookConfig>,
}

/// A static top-of-book for the three legs of the paper venue.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperBookConfig {
    pub ab_bid: Decimal,
    pub ab_ask: Decimal,
    pub bc_bid: Decimal,
    pub bc_ask: Decimal,
    pub ac_bid: Decimal,
    pub ac_ask: Decimal,
    #[serde(default = "default_book_size")]
    pub size: Decimal,
}

fn default_book_size() -> Decimal {
    Decimal::ONE
}

fn default_taker_fee() -> Decimal {
    Decimal::new(1, 3) // 0.001
}

fn default_min_notional() -> Decimal {
    Decimal::from(5)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            taker_fee: default_taker_fee(),
            min_notionals: HashMap::new(),
            min_notional: default_min_notional(),
            balances: HashMap::new(),
            book: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.venues.is_empty() {
            return Err(Error::Config(ConfigError::MissingField { field: "venues" }));
        }
        for venue in &self.venues {
            if venue.name.is_empty() {
                return Err(Error::Config(ConfigError::MissingField {
                    field: "venues.name",
                }));
            }
            if venue.poll_interval_ms == 0 {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "venues.poll_interval_ms",
                    reason: "must be positive".to_string(),
                }));
            }
            if venue.order_timeout_ms == 0 {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "venues.order_timeout_ms",
                    reason: "must be positive".to_string(),
                }));
            }
            if venue.risk.notional_cap <= Decimal::ZERO {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "venues.risk.notional_cap",
                    reason: "must be positive".to_string(),
                }));
            }
            if venue.risk.net_threshold_bps < Decimal::ZERO {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "venues.risk.net_threshold_bps",
                    reason: "must not be negative".to_string(),
                }));
            }
            if venue.breaker.consecutive_failures == 0 {
                return Err(Error::Config(ConfigError::InvalidValue {
                    field: "venues.breaker.consecutive_failures",
                    reason: "must be at least 1".to_string(),
                }));
            }
            if let Some(book) = &venue.paper.book {
                let prices = [
                    book.ab_bid,
                    book.ab_ask,
                    book.bc_bid,
                    book.bc_ask,
                    book.ac_bid,
                    book.ac_ask,
                ];
                if prices.iter().any(|p| *p <= Decimal::ZERO) {
                    return Err(Error::Config(ConfigError::InvalidValue {
                        field: "venues.paper.book",
                        reason: "prices must be positive".to_string(),
                    }));
                }
            }
            // Surface triangle validation errors at load time, not mid-loop.
            venue.triangle.to_triangle()?;
        }
        Ok(())
    }

    /// Initialize the global tracing subscriber from the logging section.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.logging.level));

        match self.logging.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
        [[venues]]
        name = "paper"

        [venues.triangle]
        ab = "ETH/USDT"
        bc = "ETH/BTC"
        ac = "BTC/USDT"
        quote = "USDT"
        mid = "ETH"
        cross = "BTC"
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();

        assert!(config.dry_run);
        let venue = &config.venues[0];
        assert_eq!(venue.kind, VenueKind::Paper);
        assert_eq!(venue.poll_interval_ms, 250);
        assert_eq!(venue.risk.net_threshold_bps, dec!(10));
        assert_eq!(venue.risk.notional_cap, dec!(200));
        assert_eq!(venue.breaker.consecutive_failures, 3);
    }

    #[test]
    fn rejects_empty_venues() {
        let config: Config = toml::from_str("venues = []").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_failure_threshold() {
        let toml_src = format!("{MINIMAL}\n[venues.breaker]\nconsecutive_failures = 0\n");
        let config: Config = toml::from_str(&toml_src).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_book_price() {
        let toml_src = format!(
            "{MINIMAL}\n[venues.paper.book]\nab_bid = 1999\nab_ask = 0\n\
             bc_bid = 0.05\nbc_ask = 0.0501\nac_bid = 40000\nac_ask = 40010\n"
        );
        let config: Config = toml::from_str(&toml_src).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_duplicate_triangle_assets() {
        let bad = MINIMAL.replace("mid = \"ETH\"", "mid = \"USDT\"");
        let config: Config = toml::from_str(&bad).unwrap();
        assert!(config.validate().is_err());
    }
}
