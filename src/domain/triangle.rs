//! Triangle and asset identifiers.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Identifier for a single asset (currency code), e.g. `"USDT"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Asset(String);

impl Asset {
    /// Create a new asset identifier.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the underlying code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Asset {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One of the three trades composing a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Leg {
    /// Buy the mid asset with the quote asset (e.g. buy ETH with USDT).
    Ab,
    /// Sell the mid asset for the cross asset (e.g. sell ETH for BTC).
    Bc,
    /// Sell the cross asset back into the quote asset (e.g. sell BTC for USDT).
    Ac,
}

impl Leg {
    /// All legs in execution order.
    pub const ALL: [Leg; 3] = [Leg::Ab, Leg::Bc, Leg::Ac];
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::Ab => write!(f, "AB"),
            Leg::Bc => write!(f, "BC"),
            Leg::Ac => write!(f, "AC"),
        }
    }
}

/// A closed three-pair trading cycle over assets A -> B -> C -> A.
///
/// `quote` is asset A (the currency the cycle starts and ends in), `mid`
/// is asset B, and `cross` is asset C. Immutable once constructed; built
/// from configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triangle {
    ab: String,
    bc: String,
    ac: String,
    quote: Asset,
    mid: Asset,
    cross: Asset,
}

impl Triangle {
    /// Construct a triangle, validating that symbols are non-empty and the
    /// three assets are distinct.
    pub fn new(
        ab: impl Into<String>,
        bc: impl Into<String>,
        ac: impl Into<String>,
        quote: Asset,
        mid: Asset,
        cross: Asset,
    ) -> Result<Self, ConfigError> {
        let (ab, bc, ac) = (ab.into(), bc.into(), ac.into());
        if ab.is_empty() || bc.is_empty() || ac.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "triangle",
                reason: "pair symbols must be non-empty".to_string(),
            });
        }
        if quote == mid || mid == cross || quote == cross {
            return Err(ConfigError::InvalidValue {
                field: "triangle",
                reason: format!("assets must be distinct: {quote}/{mid}/{cross}"),
            });
        }
        Ok(Self {
            ab,
            bc,
            ac,
            quote,
            mid,
            cross,
        })
    }

    /// Symbol traded on the given leg.
    #[must_use]
    pub fn symbol(&self, leg: Leg) -> &str {
        match leg {
            Leg::Ab => &self.ab,
            Leg::Bc => &self.bc,
            Leg::Ac => &self.ac,
        }
    }

    /// Asset A: the quote currency the cycle starts and ends in.
    #[must_use]
    pub fn quote_asset(&self) -> &Asset {
        &self.quote
    }

    /// Asset B: acquired on leg AB, sold on leg BC.
    #[must_use]
    pub fn mid_asset(&self) -> &Asset {
        &self.mid
    }

    /// Asset C: acquired on leg BC, sold on leg AC.
    #[must_use]
    pub fn cross_asset(&self) -> &Asset {
        &self.cross
    }

    /// Short human-readable label, e.g. `ETH/USDT>ETH/BTC>BTC/USDT`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}>{}>{}", self.ab, self.bc, self.ac)
    }
}

impl std::fmt::Display for Triangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth_triangle() -> Triangle {
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
    fn symbols_by_leg() {
        let tri = eth_triangle();
        assert_eq!(tri.symbol(Leg::Ab), "ETH/USDT");
        assert_eq!(tri.symbol(Leg::Bc), "ETH/BTC");
        assert_eq!(tri.symbol(Leg::Ac), "BTC/USDT");
    }

    #[test]
    fn rejects_duplicate_assets() {
        let err = Triangle::new(
            "ETH/USDT",
            "ETH/BTC",
            "BTC/USDT",
            Asset::from("USDT"),
            Asset::from("USDT"),
            Asset::from("BTC"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn rejects_empty_symbol() {
        let err = Triangle::new(
            "",
            "ETH/BTC",
            "BTC/USDT",
            Asset::from("USDT"),
            Asset::from("ETH"),
            Asset::from("BTC"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn label_joins_symbols() {
        assert_eq!(eth_triangle().label(), "ETH/USDT>ETH/BTC>BTC/USDT");
    }
}
