//! Net-edge computation for a triangular cycle.
//!
//! Pure arithmetic over decimals: no mutation, no error conditions.
//! Callers must exclude missing or non-positive prices before calling
//! (the risk gate treats those as skips, never as panics here).

use rust_decimal::Decimal;

use crate::domain::{Leg, Price, QuoteView};

/// Taker fees applied per leg.
///
/// Most venues charge one flat taker rate; per-leg overrides exist for
/// venues with pair-specific schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    taker: Decimal,
    per_leg: Option<[Decimal; 3]>,
}

impl FeeSchedule {
    /// Flat taker rate applied to all three legs.
    #[must_use]
    pub const fn flat(taker: Decimal) -> Self {
        Self {
            taker,
            per_leg: None,
        }
    }

    /// Pair-specific rates in leg order (AB, BC, AC).
    #[must_use]
    pub const fn per_leg(ab: Decimal, bc: Decimal, ac: Decimal) -> Self {
        Self {
            taker: ab,
            per_leg: Some([ab, bc, ac]),
        }
    }

    /// Fee rate charged on the given leg.
    #[must_use]
    pub fn leg_rate(&self, leg: Leg) -> Decimal {
        match self.per_leg {
            Some(rates) => match leg {
                Leg::Ab => rates[0],
                Leg::Bc => rates[1],
                Leg::Ac => rates[2],
            },
            None => self.taker,
        }
    }

    /// The multiplicative factor surviving all three legs' fees:
    /// `(1-fee)^3` for a flat rate, `(1-ab)(1-bc)(1-ac)` otherwise.
    #[must_use]
    pub fn keep_factor(&self) -> Decimal {
        Leg::ALL
            .iter()
            .map(|l| Decimal::ONE - self.leg_rate(*l))
            .product()
    }
}

/// Implied round-trip return before fees:
/// `(1/ask_ab) * bid_bc * bid_ac - 1`.
#[must_use]
pub fn gross_edge(ask_ab: Price, bid_bc: Price, bid_ac: Price) -> Decimal {
    (Decimal::ONE / ask_ab) * bid_bc * bid_ac - Decimal::ONE
}

/// Implied round-trip return net of per-leg taker fees.
#[must_use]
pub fn net_edge(ask_ab: Price, bid_bc: Price, bid_ac: Price, fees: &FeeSchedule) -> Decimal {
    (Decimal::ONE / ask_ab) * bid_bc * bid_ac * fees.keep_factor() - Decimal::ONE
}

/// Net edge straight from a quote snapshot.
#[must_use]
pub fn net_edge_of_view(view: &QuoteView, fees: &FeeSchedule) -> Decimal {
    net_edge(
        view.leg(Leg::Ab).ask(),
        view.leg(Leg::Bc).bid(),
        view.leg(Leg::Ac).bid(),
        fees,
    )
}

/// Gross edge straight from a quote snapshot.
#[must_use]
pub fn gross_edge_of_view(view: &QuoteView) -> Decimal {
    gross_edge(
        view.leg(Leg::Ab).ask(),
        view.leg(Leg::Bc).bid(),
        view.leg(Leg::Ac).bid(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected} +/- {tol}, got {actual}"
        );
    }

    #[test]
    fn reference_arithmetic_scenario() {
        // (1/2000) * 0.05 * 60000 * 0.999^3 - 1 = 0.4955045...
        let net = net_edge(
            dec!(2000),
            dec!(0.05),
            dec!(60000),
            &FeeSchedule::flat(dec!(0.001)),
        );
        assert_close(net, dec!(0.4955045), dec!(0.0000001));
    }

    #[test]
    fn gross_edge_ignores_fees() {
        let gross = gross_edge(dec!(2000), dec!(0.05), dec!(60000));
        assert_eq!(gross, dec!(0.5));
    }

    #[test]
    fn zero_fee_matches_gross() {
        let fees = FeeSchedule::flat(Decimal::ZERO);
        assert_eq!(
            net_edge(dec!(2000), dec!(0.05), dec!(60000), &fees),
            gross_edge(dec!(2000), dec!(0.05), dec!(60000)),
        );
    }

    #[test]
    fn per_leg_overrides_replace_cubed_term() {
        let flat = FeeSchedule::flat(dec!(0.001));
        let same = FeeSchedule::per_leg(dec!(0.001), dec!(0.001), dec!(0.001));
        assert_eq!(flat.keep_factor(), same.keep_factor());

        let mixed = FeeSchedule::per_leg(dec!(0.001), dec!(0.002), dec!(0.0005));
        let expected = (Decimal::ONE - dec!(0.001))
            * (Decimal::ONE - dec!(0.002))
            * (Decimal::ONE - dec!(0.0005));
        assert_eq!(mixed.keep_factor(), expected);
        assert_eq!(mixed.leg_rate(Leg::Bc), dec!(0.002));
    }

    #[test]
    fn unprofitable_cycle_is_negative() {
        // Fair prices: cycle product exactly 1.0, so fees drag it negative.
        let net = net_edge(
            dec!(2000),
            dec!(0.05),
            dec!(40000),
            &FeeSchedule::flat(dec!(0.001)),
        );
        assert!(net < Decimal::ZERO);
    }
}
