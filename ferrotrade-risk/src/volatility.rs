use derive_more::Constructor;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Scales position sizes and risk limits based on a baseline volatility (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, Constructor)]
pub struct VolatilityScaler {
    /// Baseline volatility at which the scale factor is 1.0.
    pub base_volatility: Decimal,
    pub min_scale: Decimal,
    pub max_scale: Decimal,
}

impl VolatilityScaler {
    pub fn scale(&self, volatility: Decimal) -> Decimal {
        if volatility <= Decimal::ZERO {
            return self.max_scale;
        }
        let mut factor = self.base_volatility / volatility;
        if factor < self.min_scale {
            factor = self.min_scale;
        } else if factor > self.max_scale {
            factor = self.max_scale;
        }
        factor
    }

    pub fn adjust_position(&self, base_size: Decimal, volatility: Decimal) -> Decimal {
        base_size * self.scale(volatility)
    }

    pub fn adjust_risk(&self, base_limit: Decimal, volatility: Decimal) -> Decimal {
        base_limit * self.scale(volatility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn scale_clamps_to_configured_bounds() {
        let scaler = VolatilityScaler::new(dec!(0.02), dec!(0.5), dec!(2));
        assert_eq!(scaler.scale(dec!(0.04)), dec!(0.5));
        assert_eq!(scaler.scale(dec!(0.01)), dec!(2));
        assert_eq!(scaler.scale(dec!(0)), dec!(2));
    }

    #[test]
    fn adjust_position_applies_the_scale_factor() {
        let scaler = VolatilityScaler::new(dec!(0.02), dec!(0.5), dec!(2));
        assert_eq!(scaler.adjust_position(dec!(10), dec!(0.04)), dec!(5));
    }
}
