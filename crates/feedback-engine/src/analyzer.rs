//! Round-over-round performance deltas.

use feedback_core::RoundResult;

/// Normalized change between two rounds.
///
/// `revenue_change` and `profit_change` are percent-of-previous; margin and
/// market share changes are absolute percentage points.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Deltas {
    pub revenue_change: f64,
    pub profit_change: f64,
    pub margin_change: f64,
    pub market_share_change: f64,
    /// No previous round to compare against; all changes are zero.
    pub is_first_round: bool,
}

impl Deltas {
    pub fn first_round() -> Self {
        Self {
            is_first_round: true,
            ..Self::default()
        }
    }
}

/// Compare the current round against the previous one, if any.
///
/// Denominators are clamped to at least 1 so tiny or zero previous values
/// never divide by zero.
pub fn analyze(previous: Option<&RoundResult>, current: &RoundResult) -> Deltas {
    let Some(prev) = previous else {
        return Deltas::first_round();
    };
    Deltas {
        revenue_change: (current.revenue - prev.revenue) / prev.revenue.max(1.0) * 100.0,
        profit_change: (current.profit - prev.profit) / prev.profit.abs().max(1.0) * 100.0,
        margin_change: current.margin - prev.margin,
        market_share_change: current.market_share - prev.market_share,
        is_first_round: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(revenue: f64, profit: f64, margin: f64, share: f64) -> RoundResult {
        RoundResult {
            revenue,
            profit,
            margin,
            market_share: share,
            ..Default::default()
        }
    }

    #[test]
    fn first_round_has_zero_deltas() {
        let d = analyze(None, &result(50_000.0, 8_000.0, 16.0, 12.0));
        assert!(d.is_first_round);
        assert_eq!(d.revenue_change, 0.0);
        assert_eq!(d.profit_change, 0.0);
        assert_eq!(d.margin_change, 0.0);
        assert_eq!(d.market_share_change, 0.0);
    }

    #[test]
    fn revenue_growth_is_percent_of_previous() {
        let prev = result(40_000.0, 8_000.0, 16.0, 12.0);
        let cur = result(50_000.0, 8_000.0, 16.0, 12.0);
        let d = analyze(Some(&prev), &cur);
        assert!(!d.is_first_round);
        assert_eq!(d.revenue_change, 25.0);
        assert_eq!(d.profit_change, 0.0);
    }

    #[test]
    fn profit_change_uses_absolute_previous() {
        let prev = result(1.0, -2_000.0, 0.0, 0.0);
        let cur = result(1.0, 1_000.0, 0.0, 0.0);
        let d = analyze(Some(&prev), &cur);
        assert_eq!(d.profit_change, 150.0);
    }

    #[test]
    fn small_denominators_are_clamped_to_one() {
        let prev = result(0.0, 0.5, 10.0, 5.0);
        let cur = result(100.0, 2.5, 12.5, 3.0);
        let d = analyze(Some(&prev), &cur);
        assert_eq!(d.revenue_change, 10_000.0);
        assert_eq!(d.profit_change, 200.0);
        assert_eq!(d.margin_change, 2.5);
        assert_eq!(d.market_share_change, -2.0);
    }

    proptest! {
        #[test]
        fn deltas_are_finite_for_finite_inputs(
            r0 in -1e7f64..1e7, r1 in -1e7f64..1e7,
            p0 in -1e7f64..1e7, p1 in -1e7f64..1e7,
        ) {
            let d = analyze(Some(&result(r0, p0, 0.0, 0.0)), &result(r1, p1, 0.0, 0.0));
            prop_assert!(d.revenue_change.is_finite());
            prop_assert!(d.profit_change.is_finite());
        }
    }
}
