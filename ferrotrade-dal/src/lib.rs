#![forbid(unsafe_code)]

//! Streaming manager (C4) and market-data façade (C5) over the vendor (C1) and
//! filter/regime (C2, C3) layers.

pub mod error;
pub mod facade;
pub mod persistence;
pub mod queue;
pub mod stream;
pub mod telemetry;

pub use error::DalError;
pub use facade::MarketDataDal;
pub use persistence::{InMemoryMetadataStore, MetadataStore, PriceSnapshotRow};
pub use stream::{BackfillFn, StreamingManager, StreamingManagerConfig};

