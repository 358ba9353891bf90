use chrono::{DateTime, Utc};
use ferrotrade_core::{Interval, Symbol, VendorId};
use tracing::info;

/// Emits the `bars.snapshot` telemetry event (spec.md §4.5 step 2): one structured log line per
/// fetch, carrying the shape a real event bus subscriber would need without requiring one here.
pub fn bars_snapshot(
    symbol: &Symbol,
    vendor: VendorId,
    interval: Interval,
    count: usize,
    first_ts: Option<DateTime<Utc>>,
    last_ts: Option<DateTime<Utc>>,
) {
    info!(
        event = "bars.snapshot",
        %symbol,
        %vendor,
        %interval,
        count,
        first_ts = first_ts.map(|t| t.to_rfc3339()),
        last_ts = last_ts.map(|t| t.to_rfc3339()),
    );
}

/// Emits the `signals.snapshot` telemetry event (spec.md §4.5 step 7): counts only.
pub fn signals_snapshot(symbol: &Symbol, vendor: VendorId, count: usize) {
    info!(event = "signals.snapshot", %symbol, %vendor, count);
}

/// Emits the `regimes.snapshot` telemetry event (spec.md §4.5 step 7): counts only.
pub fn regimes_snapshot(symbol: &Symbol, vendor: VendorId, count: usize) {
    info!(event = "regimes.snapshot", %symbol, %vendor, count);
}
