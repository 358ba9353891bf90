use crate::error::VendorError;
use crate::stream::RawEventStream;
use async_trait::async_trait;
use ferrotrade_core::{Bars, FetchRequest, Interval, Symbol, VendorId};

/// Uniform interface over each upstream market-data vendor (spec.md §4.1).
///
/// A streaming-capable implementation additionally reports `supports_streaming() == true`;
/// the live streaming loop itself lives in [`crate::stream::RawEventStream`] rather than on
/// this trait, since it is an infinite lazy sequence rather than a single request/response.
#[async_trait]
pub trait VendorClient: Send + Sync {
    fn vendor_id(&self) -> VendorId;

    /// Whether this client instance has credentials sufficient to stream live data.
    fn supports_streaming(&self) -> bool {
        false
    }

    /// Fetch historical bars for the given request. Non-retryable HTTP failures return an
    /// empty [`Bars`] and log a structured warning rather than raising (spec.md §4.1); only
    /// genuinely exceptional conditions (unsupported interval, missing credentials, exhausted
    /// auth retries) raise [`VendorError`].
    async fn fetch_bars(&self, request: FetchRequest) -> Result<Bars, VendorError>;

    /// Open a live tick stream for `symbols` at `interval`. Only meaningful when
    /// [`Self::supports_streaming`] is `true`; the default implementation fails fast for every
    /// client in this build, since none of them carry real-time/websocket credentials
    /// (spec.md §4.1, §4.5).
    fn open_stream(
        &self,
        _symbols: &[Symbol],
        _interval: Interval,
    ) -> Result<RawEventStream, VendorError> {
        Err(VendorError::StreamingUnsupported {
            vendor: self.vendor_id(),
        })
    }
}
