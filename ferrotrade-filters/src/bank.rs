use crate::butterworth::ButterworthFilter;
use crate::ema::EmaFilter;
use crate::kalman::{KalmanConfig, KalmanFilter1D};
use ferrotrade_core::{Bars, SignalFrame};

/// Configuration for the combined Kalman/Butterworth/EMA filter bank (spec.md §4.2).
#[derive(Debug, Clone, Copy)]
pub struct FilterBankConfig {
    pub kalman: KalmanConfig,
    pub butterworth_cutoff: f64,
    pub butterworth_order: u32,
    pub ema_span: u32,
}

impl Default for FilterBankConfig {
    fn default() -> Self {
        Self {
            kalman: KalmanConfig::default(),
            butterworth_cutoff: 0.1,
            butterworth_order: 2,
            ema_span: 10,
        }
    }
}

/// Combines the three filters into one per-symbol stateful unit, producing one
/// [`SignalFrame`] per input bar (spec.md §4.2). Frame `i` depends only on bars
/// `0..=i` (causality invariant, spec.md §8).
#[derive(Debug, Clone)]
pub struct FilterBank {
    config: FilterBankConfig,
    kalman: KalmanFilter1D,
    butterworth: ButterworthFilter,
    ema: EmaFilter,
}

impl FilterBank {
    pub fn new(config: FilterBankConfig) -> Self {
        Self {
            kalman: KalmanFilter1D::new(config.kalman),
            butterworth: ButterworthFilter::new(config.butterworth_cutoff, config.butterworth_order),
            ema: EmaFilter::new(config.ema_span),
            config,
        }
    }

    /// Discard accumulated state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.kalman = KalmanFilter1D::new(self.config.kalman);
        self.butterworth =
            ButterworthFilter::new(self.config.butterworth_cutoff, self.config.butterworth_order);
        self.ema = EmaFilter::new(self.config.ema_span);
    }

    /// Process a single observation and return the resulting frame.
    pub fn step(&mut self, frame: BarObservation) -> SignalFrame {
        let (filtered_price, velocity, uncertainty) = self.kalman.step(frame.price);
        let butterworth_price = self.butterworth.step(frame.price);
        let ema_price = self.ema.step(frame.price);

        SignalFrame {
            symbol: frame.symbol,
            vendor: frame.vendor,
            timestamp: frame.timestamp,
            price: frame.price,
            volume: frame.volume,
            filtered_price,
            velocity,
            uncertainty,
            butterworth_price,
            ema_price,
        }
    }

    /// Reset state, then process every bar in `bars` in chronological order.
    pub fn run(&mut self, bars: &Bars) -> Vec<SignalFrame> {
        if bars.is_empty() {
            return Vec::new();
        }
        self.reset();
        bars.data()
            .map(|bar| {
                self.step(BarObservation {
                    symbol: bars.symbol.clone(),
                    vendor: bars.vendor,
                    timestamp: bar.timestamp,
                    price: bar.close,
                    volume: bar.volume,
                })
            })
            .collect()
    }
}

/// A single bar reduced to the fields the filter bank actually consumes.
#[derive(Debug, Clone)]
pub struct BarObservation {
    pub symbol: ferrotrade_core::Symbol,
    pub vendor: ferrotrade_core::VendorId,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub price: f64,
    pub volume: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrotrade_core::{Bar, Bars, Symbol, VendorId};

    fn ts(i: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(1_700_000_000 + i * 60, 0).unwrap()
    }

    #[test]
    fn run_emits_one_frame_per_bar() {
        let mut bars = Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test");
        for i in 0..5 {
            bars.push(Bar::new(ts(i), 100.0, 101.0, 99.0, 100.0 + i as f64, 1000.0));
        }
        let mut bank = FilterBank::new(FilterBankConfig::default());
        let frames = bank.run(&bars);
        assert_eq!(frames.len(), 5);
    }

    #[test]
    fn empty_bars_yield_no_frames() {
        let bars = Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test");
        let mut bank = FilterBank::new(FilterBankConfig::default());
        assert!(bank.run(&bars).is_empty());
    }

    #[test]
    fn run_resets_state_between_calls() {
        let mut bars = Bars::new(Symbol::new("AAPL"), VendorId::Alpaca, "test");
        for i in 0..3 {
            bars.push(Bar::new(ts(i), 100.0, 101.0, 99.0, 100.0, 1000.0));
        }
        let mut bank = FilterBank::new(FilterBankConfig::default());
        let first = bank.run(&bars);
        let second = bank.run(&bars);
        assert_eq!(first[0].filtered_price, second[0].filtered_price);
    }
}
