use crate::common::{atr_series, ema_series, rolling_max_prior, StrategyRow, StrategySignal};
use crate::gates::ProbabilisticGates;

/// Parameters for the breakout strategy (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct BreakoutParams {
    pub lookback: usize,
    pub buffer: f64,
    pub trend_filter: bool,
    pub ema_span: u32,
    pub atr_len: usize,
    pub atr_mult: f64,
    /// When `false` (default), entries fire on the bar *after* the breakout bar. When `true`,
    /// entries fire on the breakout bar itself.
    pub enter_on_break_bar: bool,
    pub gates: ProbabilisticGates,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            lookback: 20,
            buffer: 0.0,
            trend_filter: true,
            ema_span: 20,
            atr_len: 14,
            atr_mult: 2.0,
            enter_on_break_bar: false,
            gates: ProbabilisticGates::default(),
        }
    }
}

/// Rolling-breakout entries, EMA-cross-down exits (spec.md §4.6 "Breakout").
pub fn generate(rows: &[StrategyRow], params: &BreakoutParams) -> Vec<StrategySignal> {
    let n = rows.len();
    if n == 0 {
        return Vec::new();
    }
    let high: Vec<f64> = rows.iter().map(|r| r.high).collect();
    let low: Vec<f64> = rows.iter().map(|r| r.low).collect();
    let close: Vec<f64> = rows.iter().map(|r| r.close).collect();

    let hh = rolling_max_prior(&high, params.lookback);
    let ema = ema_series(&close, params.ema_span);
    let atr = atr_series(&high, &low, &close, params.atr_len);

    let breakout_raw: Vec<bool> = (0..n)
        .map(|i| {
            hh[i].is_finite()
                && high[i] >= hh[i] * (1.0 + params.buffer)
                && (!params.trend_filter || close[i] > ema[i])
        })
        .collect();

    (0..n)
        .map(|i| {
            let triggered = if params.enter_on_break_bar {
                breakout_raw[i]
            } else {
                i > 0 && breakout_raw[i - 1]
            };
            let long_entry = triggered && params.gates.passes(&rows[i]);
            let long_exit = i > 0 && close[i] < ema[i] && close[i - 1] >= ema[i - 1];
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
    fn entries_shift_one_bar_unless_enter_on_break_bar_is_set() {
        let closes = [10.0, 11.0, 12.0, 11.5, 13.0, 14.0];
        let rows: Vec<_> = closes.iter().enumerate().map(|(i, &c)| row(i as i64, c)).collect();

        let shifted = BreakoutParams {
            lookback: 2,
            atr_len: 2,
            trend_filter: false,
            enter_on_break_bar: false,
            ..BreakoutParams::default()
        };
        let signals = generate(&rows, &shifted);
        let first_entry = signals.iter().position(|s| s.long_entry).unwrap();
        assert_eq!(first_entry, 3);

        let unshifted = BreakoutParams {
            enter_on_break_bar: true,
            ..shifted
        };
        let signals = generate(&rows, &unshifted);
        let first_entry = signals.iter().position(|s| s.long_entry).unwrap();
        assert_eq!(first_entry, 2);
    }

    #[test]
    fn empty_input_yields_no_signals() {
        assert!(generate(&[], &BreakoutParams::default()).is_empty());
    }
}
