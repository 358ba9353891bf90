#![forbid(unsafe_code)]

//! Order-intent and sweep-job consumers (C10): decode event-bus payloads, persist/dispatch,
//! checkpoint progress, and shut down cooperatively on `SIGINT`/`SIGTERM`.

pub mod checkpoint;
pub mod error;
pub mod order;
pub mod order_consumer;
pub mod shutdown;
pub mod sweep_job;

pub use checkpoint::{Checkpoint, InMemoryCheckpoint};
pub use error::ConsumerError;
pub use order::{intent_to_fill_records, intent_to_order_record, persist_order_payload, FillRecord, InMemoryOrderStore, OrderRecord, OrderStore};
pub use order_consumer::{OrderEvent, OrderEventConsumer};
pub use shutdown::install_signal_handlers;
pub use sweep_job::{InMemoryJobRegistry, JobDispatcher, JobRegistry, LoggingJobDispatcher, SweepJobEventConsumer};
