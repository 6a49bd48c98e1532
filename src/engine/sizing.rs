//! Depth-bounded sizing.
//!
//! Produces the single base quantity shared across all three legs, bounded
//! by the configured notional cap and by the top-of-book depth of every
//! leg after a fixed haircut.

use rust_decimal::Decimal;

use crate::domain::{Leg, Qty, QuoteView};

/// Fraction of top-level depth the sizer is allowed to consume. Fixed
/// safety margin against sudden depth withdrawal, not a tunable.
pub const DEPTH_HAIRCUT: Decimal = Decimal::from_parts(9, 0, 0, false, 1); // 0.9

/// Compute the executable base quantity for one cycle.
///
/// Starts from `notional_cap / ask_ab`, then clamps to 90% of each leg's
/// top depth converted into base units: leg AB's ask depth and leg BC's
/// bid depth are already in base units; leg AC's bid depth (cross-asset
/// units) converts through `bid_bc`.
///
/// Returns zero when any leg has no depth; the risk gate maps that to an
/// insufficient-depth skip.
#[must_use]
pub fn size_base(view: &QuoteView, notional_cap: Decimal) -> Qty {
    let ab = view.leg(Leg::Ab);
    let bc = view.leg(Leg::Bc);
    let ac = view.leg(Leg::Ac);

    if ab.ask_size().is_zero() || bc.bid_size().is_zero() || ac.bid_size().is_zero() {
        return Qty::ZERO;
    }
    if ab.ask() <= Decimal::ZERO || bc.bid() <= Decimal::ZERO {
        return Qty::ZERO;
    }

    let from_notional = notional_cap / ab.ask();
    let from_ab = ab.ask_size() * DEPTH_HAIRCUT;
    let from_bc = bc.bid_size() * DEPTH_HAIRCUT;
    let from_ac = (ac.bid_size() / bc.bid()) * DEPTH_HAIRCUT;

    from_notional.min(from_ab).min(from_bc).min(from_ac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use crate::domain::Quote;

    fn view(ab_depth: Decimal, bc_depth: Decimal, ac_depth: Decimal) -> QuoteView {
        let now = Utc::now();
        QuoteView::new(
            Quote::new(dec!(1999), dec!(2000), ab_depth, ab_depth, now),
            Quote::new(dec!(0.05), dec!(0.0501), bc_depth, bc_depth, now),
            Quote::new(dec!(60000), dec!(60010), ac_depth, ac_depth, now),
            now,
        )
    }

    #[test]
    fn depth_caps_notional_derivation() {
        // cap $200 at ask 2000 implies 0.1, but 90% of 0.05 depth wins
        let qty = size_base(&view(dec!(0.05), dec!(10), dec!(10)), dec!(200));
        assert_eq!(qty, dec!(0.045));
    }

    #[test]
    fn notional_cap_binds_when_depth_is_deep() {
        let qty = size_base(&view(dec!(10), dec!(10), dec!(100)), dec!(200));
        assert_eq!(qty, dec!(0.1));
    }

    #[test]
    fn cross_leg_depth_converts_through_bid_bc() {
        // AC depth of 0.001 BTC at bid_bc 0.05 is 0.02 base; 90% = 0.018
        let qty = size_base(&view(dec!(10), dec!(10), dec!(0.001)), dec!(200));
        assert_eq!(qty, dec!(0.018));
    }

    #[test]
    fn zero_depth_on_any_leg_sizes_zero() {
        assert_eq!(
            size_base(&view(dec!(0), dec!(10), dec!(10)), dec!(200)),
            Qty::ZERO
        );
        assert_eq!(
            size_base(&view(dec!(10), dec!(0), dec!(10)), dec!(200)),
            Qty::ZERO
        );
        assert_eq!(
            size_base(&view(dec!(10), dec!(10), dec!(0)), dec!(200)),
            Qty::ZERO
        );
    }

    #[test]
    fn never_exceeds_haircut_of_min_depth() {
        let cases = [
            (dec!(0.03), dec!(0.2), dec!(0.004)),
            (dec!(1), dec!(0.5), dec!(5)),
            (dec!(0.0001), dec!(10), dec!(10)),
        ];
        for (ab, bc, ac) in cases {
            let v = view(ab, bc, ac);
            let qty = size_base(&v, dec!(1000000));
            let min_depth_base = ab.min(bc).min(ac / dec!(0.05));
            assert!(
                qty <= min_depth_base * DEPTH_HAIRCUT,
                "qty {qty} exceeds haircut depth for ({ab}, {bc}, {ac})"
            );
        }
    }
}
