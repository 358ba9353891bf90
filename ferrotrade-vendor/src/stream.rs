use chrono::{DateTime, Utc};
use ferrotrade_core::Symbol;
use futures::stream::BoxStream;

/// One raw tick observed on a live vendor stream (spec.md §4.4).
#[derive(Debug, Clone, PartialEq)]
pub struct RawTick {
    pub symbol: Symbol,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
}

/// A vendor's lazy, potentially-infinite live stream of ticks (spec.md §4.1). Reconnection,
/// if any, happens internally to the stream; non-JSON frames are skipped upstream of this type.
pub type RawEventStream = BoxStream<'static, RawTick>;
