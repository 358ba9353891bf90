use crate::symbol::Symbol;
use crate::vendor::Interval;
use chrono::{DateTime, Utc};

/// Historical/backfill fetch parameters shared by vendor clients (C1) and the Streaming
/// Manager's gap-backfill callback (C4) (spec.md §4.1, §4.4).
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub symbol: Symbol,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub interval: Interval,
    pub limit: Option<usize>,
}

impl FetchRequest {
    pub fn new(symbol: Symbol, interval: Interval) -> Self {
        Self {
            symbol,
            start: None,
            end: None,
            interval,
            limit: None,
        }
    }

    pub fn with_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
