use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream market-data vendor identifier.
///
/// Unlike `barter-rs`'s `ExchangeId` (one variant per exchange venue), this
/// enumerates vendors of *historical/streaming OHLCV data* rather than
/// execution venues — see spec.md §4.1.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorId {
    Alpaca,
    AlphaVantage,
    Finnhub,
    Yahoo,
    TwelveData,
    Marketstack,
}

impl VendorId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alpaca => "alpaca",
            Self::AlphaVantage => "alphavantage",
            Self::Finnhub => "finnhub",
            Self::Yahoo => "yahoo",
            Self::TwelveData => "twelvedata",
            Self::Marketstack => "marketstack",
        }
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical bar interval tokens (spec.md §4.1).
///
/// Vendor clients map these to vendor-native strings; an interval with no
/// mapping for a given vendor fails with `VendorError::UnsupportedInterval`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Interval {
    Min1,
    Min5,
    Min15,
    Min30,
    Hour1,
    Day1,
}

impl Interval {
    pub const fn as_canonical(self) -> &'static str {
        match self {
            Self::Min1 => "1Min",
            Self::Min5 => "5Min",
            Self::Min15 => "15Min",
            Self::Min30 => "30Min",
            Self::Hour1 => "60Min",
            Self::Day1 => "1Day",
        }
    }

    /// Approximate interval length in seconds, used for streaming gap
    /// detection (spec.md §4.4: `gap_threshold = 3 * interval_seconds`).
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Min1 => 60,
            Self::Min5 => 300,
            Self::Min15 => 900,
            Self::Min30 => 1_800,
            Self::Hour1 => 3_600,
            Self::Day1 => 86_400,
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_canonical())
    }
}
