use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical market-state label (spec.md §3, §4.3).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    TrendUp,
    TrendDown,
    Sideways,
    Calm,
    HighVolatility,
    Uncertain,
    Unknown,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TrendUp => "trend_up",
            Self::TrendDown => "trend_down",
            Self::Sideways => "sideways",
            Self::Calm => "calm",
            Self::HighVolatility => "high_volatility",
            Self::Uncertain => "uncertain",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Regime label plus the scalars it was derived from, for one
/// [`SignalFrame`](crate::signal::SignalFrame) (spec.md §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeSnapshot {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub regime: Regime,
    pub volatility: f64,
    pub uncertainty: f64,
    pub momentum: f64,
}
