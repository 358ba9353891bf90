#![forbid(unsafe_code)]

//! Long-only backtest engine (C7) and parameter sweep runner (C8).

pub mod costs;
pub mod engine;
pub mod metrics;
pub mod sweep;
pub mod trade;

pub use costs::Costs;
pub use engine::{BacktestBar, BacktestConfig, BacktestResult, EntryPrice, MtmPrice, RiskModel, run_long_only};
pub use metrics::{compute as compute_metrics, Metrics};
pub use sweep::{expand_param_grid, run_sweep, JobResult, ParamCombo, ParamGrid};
pub use trade::{EquityPoint, ExitReason, TradeRecord};
