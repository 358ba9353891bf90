#![forbid(unsafe_code)]

//! Low-level framework for composing HTTP and channel integrations with market-data vendors.
//!
//! Utilised by `ferrotrade-vendor` to build REST clients sharing one retry policy and one
//! rate limiter per vendor, and by `ferrotrade-dal`/`ferrotrade-consumers` to move data between
//! internal stages over unbounded mpsc channels.

/// All [`Error`](error::Error)s generated in `ferrotrade-integration`.
pub mod error;

/// [`Tx`](channel::Tx) abstraction over channel kinds, plus channel utilities.
pub mod channel;

/// Configurable HTTP REST client, retry policy and request/response traits.
pub mod http;

/// Token-bucket rate limiter with priority queues and adaptive backoff.
pub mod rate_limit;

/// Determines if something is considered "unrecoverable", such as a channel send error.
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}
