use ferrotrade_core::Symbol;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk violations raised by the trackers in this crate (spec.md §4.7, §4.9 `risk_size`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RiskViolation<InstrumentKey = Symbol> {
    ExposureLimit {
        instrument: InstrumentKey,
        exposure: Decimal,
        limit: Decimal,
    },
    DrawdownLimit {
        instrument: InstrumentKey,
        drawdown: Decimal,
        limit: Decimal,
    },
    CorrelationLimit {
        instruments: (InstrumentKey, InstrumentKey),
        combined_exposure: Decimal,
        limit: Decimal,
    },
}

/// Receives risk violations as they're raised by the trackers.
pub trait RiskAlertHook<InstrumentKey = Symbol> {
    fn alert(&self, violation: RiskViolation<InstrumentKey>);
}

/// Alert hook that accumulates violations in a vector, for tests and the backtest engine.
pub struct VecAlertHook<InstrumentKey = Symbol> {
    pub alerts: Mutex<Vec<RiskViolation<InstrumentKey>>>,
}

impl<InstrumentKey> Default for VecAlertHook<InstrumentKey> {
    fn default() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
        }
    }
}

impl<InstrumentKey> RiskAlertHook<InstrumentKey> for VecAlertHook<InstrumentKey>
where
    InstrumentKey: Clone,
{
    fn alert(&self, violation: RiskViolation<InstrumentKey>) {
        self.alerts.lock().push(violation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_alert_hook_accumulates_in_order() {
        let hook = VecAlertHook::<Symbol>::default();
        hook.alert(RiskViolation::ExposureLimit {
            instrument: Symbol::new("AAPL"),
            exposure: Decimal::from(100),
            limit: Decimal::from(50),
        });
        hook.alert(RiskViolation::DrawdownLimit {
            instrument: Symbol::new("AAPL"),
            drawdown: Decimal::from(1),
            limit: Decimal::from(0),
        });
        assert_eq!(hook.alerts.lock().len(), 2);
    }
}
