use crate::symbol::Symbol;
use crate::vendor::VendorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single OHLCV observation, normalised to UTC at ingress.
///
/// Immutable once constructed: `Bar::new` enforces `low <= open,close <= high`
/// and `volume >= 0` (spec.md §3) by clamping `low`/`high` rather than
/// panicking, since upstream vendor payloads occasionally violate this by a
/// rounding epsilon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        let lo = low.min(open).min(close).min(high);
        let hi = high.max(open).max(close).max(low);
        Self {
            timestamp,
            open,
            high: hi,
            low: lo,
            close,
            volume: volume.max(0.0),
        }
    }
}

/// Ordered sequence of [`Bar`] for one `(symbol, vendor)` pair.
///
/// Insertion preserves chronological order; duplicate timestamps are
/// collapsed last-wins (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bars {
    pub symbol: Symbol,
    pub vendor: VendorId,
    pub source_tag: String,
    data: BTreeMap<DateTime<Utc>, Bar>,
}

impl Bars {
    pub fn new(symbol: Symbol, vendor: VendorId, source_tag: impl Into<String>) -> Self {
        Self {
            symbol,
            vendor,
            source_tag: source_tag.into(),
            data: BTreeMap::new(),
        }
    }

    /// Insert a [`Bar`], overwriting any existing bar at the same timestamp.
    pub fn push(&mut self, bar: Bar) {
        self.data.insert(bar.timestamp, bar);
    }

    pub fn extend(&mut self, bars: impl IntoIterator<Item = Bar>) {
        for bar in bars {
            self.push(bar);
        }
    }

    /// Chronologically ordered bars.
    pub fn data(&self) -> impl Iterator<Item = &Bar> {
        self.data.values()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.data.values().next()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.data.values().next_back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(i: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + i * 60, 0).unwrap()
    }

    #[test]
    fn invariant_low_le_high() {
        let bar = Bar::new(ts(0), 10.0, 9.0, 11.0, 10.5, 100.0);
        assert!(bar.low <= bar.open && bar.open <= bar.high);
        assert!(bar.low <= bar.close && bar.close <= bar.high);
    }

    #[test]
    fn duplicate_timestamps_collapse_last_wins() {
        let mut bars = Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test");
        bars.push(Bar::new(ts(0), 1.0, 1.0, 1.0, 1.0, 1.0));
        bars.push(Bar::new(ts(0), 2.0, 2.0, 2.0, 2.0, 2.0));
        assert_eq!(bars.len(), 1);
        assert_eq!(bars.last().unwrap().close, 2.0);
    }

    #[test]
    fn insertion_is_chronological_regardless_of_push_order() {
        let mut bars = Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test");
        bars.push(Bar::new(ts(2), 1.0, 1.0, 1.0, 1.0, 1.0));
        bars.push(Bar::new(ts(0), 1.0, 1.0, 1.0, 1.0, 1.0));
        bars.push(Bar::new(ts(1), 1.0, 1.0, 1.0, 1.0, 1.0));
        let timestamps: Vec<_> = bars.data().map(|b| b.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
    }
}
