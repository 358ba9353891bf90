use chrono::{DateTime, Utc};
use ferrotrade_core::{Bar, Bars, Regime, RegimeSnapshot, SignalFrame};

/// One bar joined with its filtered signal and regime label, the common input shape every
/// strategy in this crate consumes (spec.md §4.6).
///
/// `close` is picked from the priority list `[prob_filtered_price, filtered_price, prob_price,
/// prob_butterworth_price, close, adj_close, c]`; in this build only `filtered_price` and the
/// raw bar `close` are ever populated, so the priority collapses to "prefer the filtered price".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyRow {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub velocity: Option<f64>,
    pub regime: Option<Regime>,
}

fn pick_close(bar: &Bar, signal: Option<&SignalFrame>) -> f64 {
    match signal {
        Some(signal) if signal.filtered_price.is_finite() => signal.filtered_price,
        _ => bar.close,
    }
}

/// Build the joined [`StrategyRow`] frame from the parallel bars/signals/regimes produced by a
/// single fetch (spec.md §4.6 "Common preprocessing"). `signals` and `regimes` are assumed
/// index-aligned with `bars` (the invariant `ProbabilisticBatch` enforces); shorter inputs just
/// leave the trailing rows without a `velocity`/`regime`.
pub fn build_frame(bars: &Bars, signals: &[SignalFrame], regimes: &[RegimeSnapshot]) -> Vec<StrategyRow> {
    bars.data()
        .enumerate()
        .map(|(i, bar)| {
            let signal = signals.get(i);
            let regime = regimes.get(i).map(|r| r.regime);
            StrategyRow {
                timestamp: bar.timestamp,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: pick_close(bar, signal),
                volume: bar.volume,
                velocity: signal.map(|s| s.velocity),
                regime,
            }
        })
        .collect()
}

/// A strategy's verdict for one bar: whether to enter/exit long, plus the ATR used to size the
/// trailing stop downstream in the backtest engine (spec.md §4.6, §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategySignal {
    pub timestamp: DateTime<Utc>,
    pub long_entry: bool,
    pub long_exit: bool,
    pub atr: f64,
}

/// Exponential moving average over a whole series, `alpha = 2 / (span + 1)`. `span <= 1`
/// disables smoothing.
pub fn ema_series(values: &[f64], span: u32) -> Vec<f64> {
    if span <= 1 {
        return values.to_vec();
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;
    for &v in values {
        let next = match prev {
            None => v,
            Some(p) => alpha * v + (1.0 - alpha) * p,
        };
        out.push(next);
        prev = Some(next);
    }
    out
}

/// `hh[i]` = max of `high[i-window..i]` (prior bars only, excluding the current bar). `NaN`
/// before `window` prior bars exist.
pub fn rolling_max_prior(high: &[f64], window: usize) -> Vec<f64> {
    (0..high.len())
        .map(|i| {
            if i < window {
                f64::NAN
            } else {
                high[i - window..i].iter().cloned().fold(f64::NEG_INFINITY, f64::max)
            }
        })
        .collect()
}

/// Average true range over a trailing `window` of bars (simple moving average of true range,
/// not Wilder-smoothed). `true_range[0] = high[0] - low[0]`.
pub fn atr_series(high: &[f64], low: &[f64], close: &[f64], window: usize) -> Vec<f64> {
    let n = high.len();
    let mut tr = Vec::with_capacity(n);
    for i in 0..n {
        let range = high[i] - low[i];
        let tr_i = if i == 0 {
            range
        } else {
            range
                .max((high[i] - close[i - 1]).abs())
                .max((low[i] - close[i - 1]).abs())
        };
        tr.push(tr_i);
    }
    (0..n)
        .map(|i| {
            let start = i.saturating_sub(window.saturating_sub(1));
            let slice = &tr[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// `(v[i] - v[i-lookback]) / v[i-lookback]`, `NaN` until `lookback` prior values exist.
pub fn pct_change(values: &[f64], lookback: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if i < lookback || values[i - lookback] == 0.0 {
                f64::NAN
            } else {
                (values[i] - values[i - lookback]) / values[i - lookback]
            }
        })
        .collect()
}

/// Rolling percentile rank of `values[i]` within the trailing `window` (inclusive), in `[0, 1]`.
pub fn rolling_rank(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(window.saturating_sub(1));
            let slice = &values[start..=i];
            let below = slice.iter().filter(|&&v| v <= values[i]).count();
            below as f64 / slice.len() as f64
        })
        .collect()
}

/// Rolling `(mean, std)` over a trailing `window` (inclusive), population standard deviation.
pub fn rolling_mean_std(values: &[f64], window: usize) -> Vec<(f64, f64)> {
    (0..values.len())
        .map(|i| {
            let start = i.saturating_sub(window.saturating_sub(1));
            let slice = &values[start..=i];
            let mean = slice.iter().sum::<f64>() / slice.len() as f64;
            let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / slice.len() as f64;
            (mean, variance.sqrt())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_span_of_one_passes_through() {
        assert_eq!(ema_series(&[1.0, 2.0, 3.0], 1), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn rolling_max_prior_excludes_current_bar() {
        let highs = [10.0, 11.0, 12.0, 11.5, 13.0, 14.0];
        let hh = rolling_max_prior(&highs, 2);
        assert!(hh[0].is_nan() && hh[1].is_nan());
        assert_eq!(hh[2], 11.0);
        assert_eq!(hh[3], 12.0);
        assert_eq!(hh[4], 12.0);
        assert_eq!(hh[5], 13.0);
    }

    #[test]
    fn atr_of_a_flat_series_is_zero() {
        let close = [10.0; 5];
        let atr = atr_series(&close, &close, &close, 3);
        assert!(atr.iter().all(|&a| a == 0.0));
    }
}
