#![forbid(unsafe_code)]

//! Pure breakout/momentum/mean-reversion signal generators (C6). Each strategy is a stateless
//! `(&[StrategyRow], &Params) -> Vec<StrategySignal>` function; no strategy holds position
//! state, which lives entirely in the backtest engine (C7).

pub mod breakout;
pub mod common;
pub mod gates;
pub mod mean_reversion;
pub mod momentum;

pub use breakout::BreakoutParams;
pub use common::{build_frame, StrategyRow, StrategySignal};
pub use gates::ProbabilisticGates;
pub use mean_reversion::MeanReversionParams;
pub use momentum::MomentumParams;
