use crate::common::StrategyRow;
use ferrotrade_core::Regime;

/// Probabilistic gates every strategy applies on top of its own entry logic (spec.md §4.6
/// "All strategies honor two probabilistic gates when those columns exist"). Absent columns
/// (no [`SignalFrame`](ferrotrade_core::SignalFrame)/[`RegimeSnapshot`](ferrotrade_core::RegimeSnapshot)
/// joined for a row) pass the corresponding gate unconditionally.
#[derive(Debug, Clone, Default)]
pub struct ProbabilisticGates {
    pub min_prob_velocity: Option<f64>,
    pub regime_whitelist: Option<Vec<Regime>>,
}

impl ProbabilisticGates {
    pub fn passes(&self, row: &StrategyRow) -> bool {
        if let (Some(min_velocity), Some(velocity)) = (self.min_prob_velocity, row.velocity) {
            if velocity < min_velocity {
                return false;
            }
        }
        if let (Some(whitelist), Some(regime)) = (&self.regime_whitelist, row.regime) {
            if !whitelist.contains(&regime) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn row(velocity: Option<f64>, regime: Option<Regime>) -> StrategyRow {
        StrategyRow {
            timestamp: DateTime::from_timestamp(0, 0).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1.0,
            velocity,
            regime,
        }
    }

    #[test]
    fn missing_columns_pass_unconditionally() {
        let gates = ProbabilisticGates {
            min_prob_velocity: Some(0.5),
            regime_whitelist: Some(vec![Regime::TrendUp]),
        };
        assert!(gates.passes(&row(None, None)));
    }

    #[test]
    fn velocity_below_floor_fails() {
        let gates = ProbabilisticGates {
            min_prob_velocity: Some(0.5),
            regime_whitelist: None,
        };
        assert!(!gates.passes(&row(Some(0.1), None)));
        assert!(gates.passes(&row(Some(0.9), None)));
    }

    #[test]
    fn regime_outside_whitelist_fails() {
        let gates = ProbabilisticGates {
            min_prob_velocity: None,
            regime_whitelist: Some(vec![Regime::TrendUp]),
        };
        assert!(!gates.passes(&row(None, Some(Regime::Sideways))));
        assert!(gates.passes(&row(None, Some(Regime::TrendUp))));
    }
}
