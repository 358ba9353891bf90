#![forbid(unsafe_code)]

//! Kelly sizing, concentration gates, and exposure/drawdown tracking shared by the backtest
//! engine (C7) and the orchestration router (C9).

pub mod alert;
pub mod beta_kelly;
pub mod concentration;
pub mod drawdown;
pub mod exposure;
pub mod kelly;
pub mod volatility;

pub use alert::{RiskAlertHook, RiskViolation, VecAlertHook};
pub use beta_kelly::BetaWinRate;
pub use concentration::exceeds_concentration;
pub use drawdown::DrawdownTracker;
pub use exposure::ExposureTracker;
pub use kelly::FractionalKellyAgent;
pub use volatility::VolatilityScaler;
