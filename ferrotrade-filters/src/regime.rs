use ferrotrade_core::{Regime, RegimeSnapshot, SignalFrame};

/// Classifies market regime from a sequence of filtered signal frames (spec.md §4.3).
#[derive(Debug, Clone, Copy)]
pub struct RegimeClassifier {
    pub window: usize,
    pub high_vol_threshold: f64,
    pub low_vol_threshold: f64,
    pub uncertainty_threshold: f64,
    pub momentum_threshold: f64,
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self {
            window: 20,
            high_vol_threshold: 0.02,
            low_vol_threshold: 0.005,
            uncertainty_threshold: 0.05,
            momentum_threshold: 0.001,
        }
    }
}

impl RegimeClassifier {
    pub fn new(window: usize) -> Self {
        assert!(window >= 2, "window must be >= 2");
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn classify(&self, frames: &[SignalFrame]) -> Vec<RegimeSnapshot> {
        if frames.is_empty() {
            return Vec::new();
        }

        let prices: Vec<f64> = frames.iter().map(SignalFrame::regime_price).collect();
        let returns = log_returns(&prices);
        let momentum = centered_moving_average(&returns, self.window);
        let volatility = rolling_std(&returns, self.window);

        frames
            .iter()
            .enumerate()
            .map(|(idx, frame)| {
                let vol = volatility[idx];
                let uncertainty = frame.uncertainty;
                let mom = momentum[idx];

                let regime = if uncertainty > self.uncertainty_threshold {
                    Regime::Uncertain
                } else if vol >= self.high_vol_threshold {
                    Regime::HighVolatility
                } else if vol <= self.low_vol_threshold {
                    if mom >= self.momentum_threshold {
                        Regime::TrendUp
                    } else if mom <= -self.momentum_threshold {
                        Regime::TrendDown
                    } else {
                        Regime::Calm
                    }
                } else {
                    Regime::Sideways
                };

                RegimeSnapshot {
                    symbol: frame.symbol.clone(),
                    timestamp: frame.timestamp,
                    regime,
                    volatility: vol,
                    uncertainty,
                    momentum: mom,
                }
            })
            .collect()
    }
}

fn log_returns(prices: &[f64]) -> Vec<f64> {
    let log_prices: Vec<f64> = prices.iter().map(|p| (p + 1e-12).ln()).collect();
    let mut returns = Vec::with_capacity(log_prices.len());
    returns.push(0.0);
    for w in log_prices.windows(2) {
        returns.push(w[1] - w[0]);
    }
    returns
}

/// `np.convolve(returns, ones(window)/window, mode="same")`: a trailing sum of length
/// `window` ending at offset `(window - 1) / 2` past each index, zero-padded out of bounds.
fn centered_moving_average(returns: &[f64], window: usize) -> Vec<f64> {
    let n = returns.len() as isize;
    let window_isize = window as isize;
    let offset = (window_isize - 1) / 2;
    (0..n)
        .map(|i| {
            let c = i + offset;
            let lo = (c - window_isize + 1).max(0);
            let hi = c.min(n - 1);
            let sum: f64 = if hi >= lo {
                (lo..=hi).map(|k| returns[k as usize]).sum()
            } else {
                0.0
            };
            sum / window as f64
        })
        .collect()
}

fn rolling_std(data: &[f64], window: usize) -> Vec<f64> {
    let n = data.len();
    if n < window {
        let std = population_std(data);
        return vec![std; n];
    }

    let mut cumsum = vec![0.0; n + 1];
    let mut cumsum_sq = vec![0.0; n + 1];
    for i in 0..n {
        cumsum[i + 1] = cumsum[i] + data[i];
        cumsum_sq[i + 1] = cumsum_sq[i] + data[i] * data[i];
    }

    let out_len = n - window + 1;
    let windowed: Vec<f64> = (0..out_len)
        .map(|i| {
            let sum = cumsum[i + window] - cumsum[i];
            let sum_sq = cumsum_sq[i + window] - cumsum_sq[i];
            let mean = sum / window as f64;
            let mean_sq = sum_sq / window as f64;
            (mean_sq - mean * mean).max(0.0).sqrt()
        })
        .collect();

    let pad_value = windowed.first().copied().unwrap_or(0.0);
    let mut out = vec![pad_value; window - 1];
    out.extend(windowed);
    out
}

fn population_std(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / data.len() as f64;
    variance.sqrt()
}
