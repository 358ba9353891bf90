use ferrotrade_core::VendorId;
use thiserror::Error;

/// Errors a [`crate::VendorClient`] may raise (spec.md §4.1, §8.4 failure-mode table).
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("{vendor} does not support interval {interval}")]
    UnsupportedInterval { vendor: VendorId, interval: String },

    #[error("{vendor} is missing required credentials")]
    MissingCredentials { vendor: VendorId },

    #[error("{vendor} authentication failed after retry, fallback hint: {fallback_hint}")]
    AuthFailed {
        vendor: VendorId,
        fallback_hint: VendorId,
    },

    #[error("{vendor} does not support live streaming")]
    StreamingUnsupported { vendor: VendorId },

    #[error("vendor transport error: {0}")]
    Transport(#[from] ferrotrade_integration::error::Error),
}
