use chrono::{DateTime, Utc};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The trailing stop was breached intrabar.
    Stop,
    /// The strategy's own exit signal fired.
    Signal,
}

/// One entry or exit fill (spec.md §4.7 "log trade"). Kept as two separate events, mirroring
/// the per-bar loop that appends an entry record and an exit record independently.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeRecord {
    Entry {
        timestamp: DateTime<Utc>,
        price: f64,
        shares: f64,
        stop: f64,
    },
    Exit {
        timestamp: DateTime<Utc>,
        entry_price: f64,
        exit_price: f64,
        shares: f64,
        pnl: f64,
        reason: ExitReason,
    },
}

/// One bar of the equity curve: realised equity and mark-to-market equity (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub equity_mtm: f64,
}
