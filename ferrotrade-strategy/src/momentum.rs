use crate::common::{atr_series, ema_series, pct_change, rolling_rank, StrategyRow, StrategySignal};
use crate::gates::ProbabilisticGates;

/// Parameters for the momentum strategy (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct MomentumParams {
    pub roc_lookback: usize,
    pub min_roc: f64,
    pub rank_window: usize,
    pub min_rank: f64,
    pub ema_span: u32,
    pub atr_len: usize,
    pub gates: ProbabilisticGates,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            roc_lookback: 10,
            min_roc: 0.0,
            rank_window: 20,
            min_rank: 0.5,
            ema_span: 20,
            atr_len: 14,
            gates: ProbabilisticGates::default(),
        }
    }
}

/// Rate-of-change + EMA trend filter + rolling-rank entries, EMA-break exits (spec.md §4.6
/// "Momentum").
pub fn generate(rows: &[StrategyRow], params: &MomentumParams) -> Vec<StrategySignal> {
    let n = rows.len();
    if n == 0 {
        return Vec::new();
    }
    let high: Vec<f64> = rows.iter().map(|r| r.high).collect();
    let low: Vec<f64> = rows.iter().map(|r| r.low).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.close).collect();

    let ema = ema_series(&close, params.ema_span);
    let roc = pct_change(&close, params.roc_lookback);
    let rank = rolling_rank(&roc, params.rank_window);
    let atr = atr_series(&high, &low, &close, params.atr_len);

    (0..n)
        .map(|i| {
            let triggered = close[i] > ema[i]
                && roc[i].is_finite()
                && roc[i] >= params.min_roc
                && rank[i] >= params.min_rank;
            let long_entry = triggered && params.gates.passes(&rows[i]);
            let momentum_faded = roc[i].is_finite() && roc[i] < params.min_roc;
            let long_exit = close[i] < ema[i] || momentum_faded;
            StrategySignal {
                timestamp: rows[i].timestamp,
                long_entry,
                long_exit,
                atr: atr[i],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn row(i: i64, close: f64) -> StrategyRow {
        StrategyRow {
            timestamp: DateTime::from_timestamp(1_700_000_000 + i * 60, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            velocity: None,
            regime: None,
        }
    }

    #[test]
    fn steady_uptrend_eventually_enters() {
        let rows: Vec<_> = (0..30).map(|i| row(i, 100.0 + i as f64)).collect();
        let params = MomentumParams {
            roc_lookback: 5,
            rank_window: 10,
            min_rank: 0.0,
            min_roc: 0.0,
            ..MomentumParams::default()
        };
        let signals = generate(&rows, &params);
        assert!(signals.iter().any(|s| s.long_entry));
    }

    #[test]
    fn empty_input_yields_no_signals() {
        assert!(generate(&[], &MomentumParams::default()).is_empty());
    }
}
