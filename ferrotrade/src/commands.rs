use crate::cli::StrategyChoice;
use crate::synthetic::synthetic_rows;
use ferrotrade_backtest::{run_long_only, BacktestBar, BacktestConfig, JobResult, Metrics, ParamGrid};
use ferrotrade_core::Symbol;
use ferrotrade_risk::BetaWinRate;
use ferrotrade_router::{FrameSource, RouterContext, RouterRequest, RouterRow};
use ferrotrade_strategy::{BreakoutParams, MeanReversionParams, MomentumParams, StrategyRow};
use std::path::Path;

/// Generates signals for `rows` under `strategy` and joins them with OHLC into the bar shape
/// the backtest engine consumes (spec.md §4.6, §4.7).
pub fn signal_bars(rows: &[StrategyRow], strategy: StrategyChoice) -> Vec<BacktestBar> {
    let signals = match strategy {
        StrategyChoice::Breakout => ferrotrade_strategy::breakout::generate(rows, &BreakoutParams::default()),
        StrategyChoice::Momentum => ferrotrade_strategy::momentum::generate(rows, &MomentumParams::default()),
        StrategyChoice::MeanReversion => ferrotrade_strategy::mean_reversion::generate(rows, &MeanReversionParams::default()),
    };

    rows.iter()
        .zip(signals.iter())
        .map(|(row, signal)| BacktestBar {
            timestamp: row.timestamp,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            entry_event: signal.long_entry,
            exit_event: signal.long_exit,
            atr: signal.atr,
        })
        .collect()
}

/// Runs one strategy's signals through the backtest engine over `days` of synthetic bars for
/// `symbol`, gated by a fresh [`BetaWinRate`] model (spec.md §4.7).
pub fn run_backtest(symbol: &str, strategy: StrategyChoice, days: i64) -> (Vec<ferrotrade_backtest::EquityPoint>, Metrics) {
    let rows = synthetic_rows(&Symbol::new(symbol), days);
    let bars = signal_bars(&rows, strategy);
    let mut model = BetaWinRate::default();
    let result = run_long_only(&bars, BacktestConfig::default(), Some(&mut model));
    let metrics = ferrotrade_backtest::compute_metrics(&result.equity_curve);
    (result.equity_curve, metrics)
}

/// Sweeps `lookback` for the breakout strategy over a small grid, writing per-job summaries
/// under `out_dir` (spec.md §4.8).
pub fn run_sweep(symbol: &str, out_dir: &Path, max_workers: Option<usize>) -> std::io::Result<Vec<JobResult>> {
    let rows = synthetic_rows(&Symbol::new(symbol), 260);
    let mut grid = ParamGrid::new();
    grid.insert("lookback".to_string(), vec![serde_json::json!(10), serde_json::json!(20), serde_json::json!(40)]);

    ferrotrade_backtest::run_sweep(out_dir, &grid, max_workers, |_job_id, combo| {
        let lookback = combo.get("lookback").and_then(|v| v.as_u64()).unwrap_or(20) as usize;
        let params = BreakoutParams { lookback, ..BreakoutParams::default() };
        let signals = ferrotrade_strategy::breakout::generate(&rows, &params);
        let bars: Vec<BacktestBar> = rows
            .iter()
            .zip(signals.iter())
            .map(|(row, signal)| BacktestBar {
                timestamp: row.timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                entry_event: signal.long_entry,
                exit_event: signal.long_exit,
                atr: signal.atr,
            })
            .collect();
        let mut model = BetaWinRate::default();
        let result = run_long_only(&bars, BacktestConfig::default(), Some(&mut model));
        ferrotrade_backtest::compute_metrics(&result.equity_curve)
    })
}

/// No live vendor/DAL credentials are wired into this build (spec.md Non-goals exclude
/// broker/vendor integration); every `route` invocation falls back to the synthetic frame.
pub struct NoLiveSource;

impl FrameSource for NoLiveSource {
    fn fetch(&self, _request: &RouterRequest) -> Result<Vec<RouterRow>, String> {
        Err("no live data source configured in this build".to_string())
    }
}

pub fn run_route(request: RouterRequest, context: RouterContext) -> ferrotrade_router::RouterState {
    ferrotrade_router::run(request, context, &NoLiveSource)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_years_breakout_backtest_produces_at_least_one_round_trip() {
        let (curve, metrics) = run_backtest("AAPL", StrategyChoice::Breakout, 252);
        assert!(curve.len() > 200);
        assert_ne!(metrics.total_return, 0.0, "expected the synthetic trend cycle to realize at least one trade");
    }

    #[test]
    fn every_strategy_choice_runs_without_panicking() {
        for strategy in [StrategyChoice::Breakout, StrategyChoice::Momentum, StrategyChoice::MeanReversion] {
            let (curve, _metrics) = run_backtest("MSFT", strategy, 252);
            assert!(!curve.is_empty());
        }
    }

    #[test]
    fn a_sweep_writes_one_job_result_per_grid_point() {
        let dir = std::env::temp_dir().join(format!("ferrotrade-sweep-test-{}", std::process::id()));
        let results = run_sweep("AAPL", &dir, Some(2)).unwrap();
        assert_eq!(results.len(), 3);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn no_live_source_always_falls_back_to_an_order_intent() {
        let request = RouterRequest {
            symbol: ferrotrade_core::Symbol::new("AAPL"),
            start: chrono::Utc::now() - chrono::Duration::days(30),
            end: None,
            strategy: "breakout".to_string(),
            params: serde_json::json!({}),
            min_notional: rust_decimal::Decimal::from(100),
            max_notional: rust_decimal::Decimal::from(5_000),
            side: ferrotrade_core::Side::Buy,
        };
        let state = run_route(request, RouterContext::default());
        assert!(state.order_intent.is_some());
    }
}
