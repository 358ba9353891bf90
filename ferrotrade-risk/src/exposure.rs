use crate::alert::{RiskAlertHook, RiskViolation};
use ferrotrade_core::Symbol;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::hash::Hash;

/// Tracks notional exposure per instrument (spec.md §4.9 `risk_size` exposure gate).
#[derive(Debug, Default, Clone)]
pub struct ExposureTracker<InstrumentKey = Symbol> {
    exposures: HashMap<InstrumentKey, Decimal>,
}

impl<InstrumentKey> ExposureTracker<InstrumentKey>
where
    InstrumentKey: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            exposures: HashMap::new(),
        }
    }

    pub fn update(&mut self, instrument: InstrumentKey, notional: Decimal) {
        *self.exposures.entry(instrument).or_insert(Decimal::ZERO) += notional;
    }

    pub fn exposure(&self, instrument: &InstrumentKey) -> Decimal {
        *self.exposures.get(instrument).unwrap_or(&Decimal::ZERO)
    }

    pub fn check_limit(&self, instrument: InstrumentKey, limit: Decimal, hook: &impl RiskAlertHook<InstrumentKey>) {
        let exposure = self.exposure(&instrument);
        if exposure > limit {
            hook.alert(RiskViolation::ExposureLimit {
                instrument,
                exposure,
                limit,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::VecAlertHook;
    use rust_decimal_macros::dec;

    #[test]
    fn update_accumulates_per_instrument() {
        let mut tracker = ExposureTracker::<Symbol>::new();
        let aapl = Symbol::new("AAPL");
        tracker.update(aapl.clone(), dec!(100));
        tracker.update(aapl.clone(), dec!(50));
        assert_eq!(tracker.exposure(&aapl), dec!(150));
    }

    #[test]
    fn check_limit_alerts_only_when_exceeded() {
        let mut tracker = ExposureTracker::<Symbol>::new();
        let aapl = Symbol::new("AAPL");
        tracker.update(aapl.clone(), dec!(100));
        let hook = VecAlertHook::<Symbol>::default();
        tracker.check_limit(aapl.clone(), dec!(200), &hook);
        assert!(hook.alerts.lock().is_empty());
        tracker.check_limit(aapl.clone(), dec!(50), &hook);
        assert_eq!(hook.alerts.lock().len(), 1);
    }
}
