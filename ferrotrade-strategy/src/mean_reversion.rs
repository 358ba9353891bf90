use crate::common::{atr_series, rolling_mean_std, StrategyRow, StrategySignal};
use crate::gates::ProbabilisticGates;

/// Parameters for the mean-reversion strategy (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct MeanReversionParams {
    pub lookback: usize,
    pub z_entry: f64,
    pub z_exit: f64,
    pub atr_len: usize,
    pub gates: ProbabilisticGates,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        Self {
            lookback: 20,
            z_entry: -2.0,
            z_exit: 0.0,
            atr_len: 14,
            gates: ProbabilisticGates::default(),
        }
    }
}

/// Rolling z-score entries/exits (spec.md §4.6 "Mean Reversion").
pub fn generate(rows: &[StrategyRow], params: &MeanReversionParams) -> Vec<StrategySignal> {
    let n = rows.len();
    if n == 0 {
        return Vec::new();
    }
    let high: Vec<f64> = rows.iter().map(|r| r.high).collect();
    let low: Vec<f64> = rows.iter().map(|r| r.low).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.close).collect();

    let mean_std = rolling_mean_std(&close, params.lookback);
    let atr = atr_series(&high, &low, &close, params.atr_len);

    (0..n)
        .map(|i| {
            let (mean, std) = mean_std[i];
            let z = if std > 0.0 { (close[i] - mean) / std } else { 0.0 };
            let long_entry = z <= params.z_entry && params.gates.passes(&rows[i]);
            let long_exit = z >= params.z_exit;
            StrategySignal {
                timestamp: rows[i].timestamp,
                long_entry,
                long_exit,
                atr: atr[i],
            }
        })
        .collect()
}
