use rust_decimal::Decimal;

/// Whether a proposed `notional` exceeds the configured fraction of `equity` (spec.md §4.9
/// `risk_size`: "If notional ≥ kill_switch_notional, halt").
pub fn exceeds_concentration(notional: Decimal, equity: Decimal, threshold: Decimal) -> bool {
    equity > Decimal::ZERO && notional / equity > threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_equity_never_exceeds_concentration() {
        assert!(!exceeds_concentration(dec!(1000), dec!(0), dec!(0.5)));
    }

    #[test]
    fn notional_beyond_threshold_fraction_of_equity_exceeds() {
        assert!(exceeds_concentration(dec!(6000), dec!(10000), dec!(0.5)));
        assert!(!exceeds_concentration(dec!(4000), dec!(10000), dec!(0.5)));
    }
}
