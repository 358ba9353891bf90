use crate::alert::{RiskAlertHook, RiskViolation};
use ferrotrade_core::Symbol;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::hash::Hash;

/// Tracks running PnL per instrument to compute drawdown off the running peak
/// (spec.md §4.7 mark-to-market accounting).
#[derive(Debug, Default, Clone)]
pub struct DrawdownTracker<InstrumentKey = Symbol> {
    peak: HashMap<InstrumentKey, Decimal>,
    current: HashMap<InstrumentKey, Decimal>,
}

impl<InstrumentKey> DrawdownTracker<InstrumentKey>
where
    InstrumentKey: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            peak: HashMap::new(),
            current: HashMap::new(),
        }
    }

    pub fn update_pnl(&mut self, instrument: InstrumentKey, pnl: Decimal) {
        let cur = self.current.entry(instrument.clone()).or_insert(Decimal::ZERO);
        *cur += pnl;
        let peak = self.peak.entry(instrument).or_insert(*cur);
        if *cur > *peak {
            *peak = *cur;
        }
    }

    pub fn drawdown(&self, instrument: &InstrumentKey) -> Decimal {
        let cur = *self.current.get(instrument).unwrap_or(&Decimal::ZERO);
        let peak = *self.peak.get(instrument).unwrap_or(&cur);
        if peak.is_zero() {
            Decimal::ZERO
        } else {
            (peak - cur) / peak
        }
    }

    pub fn check_limit(&self, instrument: InstrumentKey, limit: Decimal, hook: &impl RiskAlertHook<InstrumentKey>) {
        let dd = self.drawdown(&instrument);
        if dd > limit {
            hook.alert(RiskViolation::DrawdownLimit {
                instrument,
                drawdown: dd,
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
    fn drawdown_is_zero_at_the_peak() {
        let mut tracker = DrawdownTracker::<Symbol>::new();
        let aapl = Symbol::new("AAPL");
        tracker.update_pnl(aapl.clone(), dec!(100));
        assert_eq!(tracker.drawdown(&aapl), dec!(0));
    }

    #[test]
    fn drawdown_reflects_retracement_from_peak() {
        let mut tracker = DrawdownTracker::<Symbol>::new();
        let aapl = Symbol::new("AAPL");
        tracker.update_pnl(aapl.clone(), dec!(100));
        tracker.update_pnl(aapl.clone(), dec!(-20));
        assert_eq!(tracker.drawdown(&aapl), dec!(0.2));
    }

    #[test]
    fn check_limit_alerts_once_drawdown_exceeds() {
        let mut tracker = DrawdownTracker::<Symbol>::new();
        let aapl = Symbol::new("AAPL");
        tracker.update_pnl(aapl.clone(), dec!(100));
        tracker.update_pnl(aapl.clone(), dec!(-50));
        let hook = VecAlertHook::<Symbol>::default();
        tracker.check_limit(aapl.clone(), dec!(0.1), &hook);
        assert_eq!(hook.alerts.lock().len(), 1);
    }
}
