#![forbid(unsafe_code)]

pub mod bank;
pub mod butterworth;
pub mod ema;
pub mod kalman;
pub mod regime;

pub use bank::{BarObservation, FilterBank, FilterBankConfig};
pub use butterworth::ButterworthFilter;
pub use ema::EmaFilter;
pub use kalman::{KalmanConfig, KalmanFilter1D};
pub use regime::RegimeClassifier;

