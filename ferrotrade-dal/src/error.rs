use ferrotrade_core::{Symbol, VendorId};
use thiserror::Error;

/// Errors the market-data façade may raise (spec.md §4.5, §7).
#[derive(Debug, Error)]
pub enum DalError {
    #[error("vendor error: {0}")]
    Vendor(#[from] ferrotrade_vendor::VendorError),

    #[error("{vendor} does not support live streaming")]
    StreamingUnsupported { vendor: VendorId },

    #[error("failed to persist artifact for {symbol}: {source}")]
    Persist {
        symbol: Symbol,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialise artifact for {symbol}: {source}")]
    Serialise {
        symbol: Symbol,
        #[source]
        source: serde_json::Error,
    },
}
