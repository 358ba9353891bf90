use crate::checkpoint::Checkpoint;
use crate::error::ConsumerError;
use crate::order::{intent_to_fill_records, intent_to_order_record, persist_order_payload, OrderStore};
use ferrotrade_core::OrderIntent;
use ferrotrade_dal::queue::BoundedDropOldestQueue;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// One unit of work for the order consumer: a raw event-bus message, or the sentinel that
/// ends the stream (spec.md §4.10).
pub enum OrderEvent {
    Message { partition: String, offset: u64, payload: String },
    EndOfStream,
}

/// Decodes [`OrderIntent`] payloads off a bounded queue and persists them via `store`,
/// checkpointing progress per partition (spec.md §4.10 `OrderEventConsumer`).
pub struct OrderEventConsumer<S> {
    store: S,
    checkpoint: crate::checkpoint::InMemoryCheckpoint,
}

impl<S: OrderStore> OrderEventConsumer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            checkpoint: crate::checkpoint::InMemoryCheckpoint::new(),
        }
    }

    pub fn checkpoint(&self) -> &crate::checkpoint::InMemoryCheckpoint {
        &self.checkpoint
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decodes and persists one payload. Non-JSON payloads are logged and skipped rather
    /// than treated as fatal (spec.md §4.10: malformed events must not stop the consumer).
    pub fn handle_payload(&mut self, partition: &str, offset: u64, payload: &str) -> Result<(), ConsumerError> {
        let intent: OrderIntent = match serde_json::from_str(payload) {
            Ok(intent) => intent,
            Err(error) => {
                warn!(%partition, %error, "order consumer: non-json payload, skipping");
                return Ok(());
            }
        };

        let order = intent_to_order_record(&intent);
        let fills = intent_to_fill_records(&order.id, &intent);
        let (symbol, qty, status, fill_count) = (order.symbol.clone(), order.qty, order.status.clone(), fills.len());

        persist_order_payload(&mut self.store, order, fills)?;
        self.checkpoint.update(partition, offset);

        info!(
            event = "order_persisted",
            %symbol,
            qty,
            %status,
            partition,
            offset,
            fills = fill_count,
            "order persisted"
        );
        Ok(())
    }

    /// Drains `queue` until a [`OrderEvent::EndOfStream`] sentinel arrives or `shutdown`
    /// flips to `true`, whichever comes first.
    pub async fn run(&mut self, queue: Arc<BoundedDropOldestQueue<OrderEvent>>, mut shutdown: watch::Receiver<bool>) {
        info!(event = "order_consumer_starting");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                event = queue.pop() => {
                    match event {
                        OrderEvent::Message { partition, offset, payload } => {
                            if let Err(error) = self.handle_payload(&partition, offset, &payload) {
                                warn!(%error, "order consumer: failed to persist event");
                            }
                        }
                        OrderEvent::EndOfStream => break,
                    }
                }
            }
        }
        info!(event = "order_consumer_stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::InMemoryOrderStore;

    fn payload(run_id: &str) -> String {
        serde_json::json!({
            "run_id": run_id,
            "symbol": "AAPL",
            "strategy": "breakout",
            "side": "buy",
            "qty": 10,
            "notional": "1000",
            "price_hint": "100",
            "params": {},
            "risk": {"kelly_fraction": 0.02, "probability": 0.6, "payoff": 1.5, "target_notional": "1000"},
            "timestamp": "2023-11-14T22:13:20Z",
            "broker_order_id": null
        })
        .to_string()
    }

    #[test]
    fn a_valid_payload_is_persisted_and_checkpointed() {
        let mut consumer = OrderEventConsumer::new(InMemoryOrderStore::new());
        consumer.handle_payload("p0", 1, &payload("run-1")).unwrap();
        assert!(consumer.store().get("run-1").is_some());
        assert_eq!(consumer.checkpoint().last_offset("p0"), Some(1));
    }

    #[test]
    fn a_non_json_payload_is_skipped_without_erroring() {
        let mut consumer = OrderEventConsumer::new(InMemoryOrderStore::new());
        let result = consumer.handle_payload("p0", 1, "not json");
        assert!(result.is_ok());
        assert_eq!(consumer.checkpoint().last_offset("p0"), None);
    }

    #[tokio::test]
    async fn run_stops_once_end_of_stream_is_pushed() {
        let queue = Arc::new(BoundedDropOldestQueue::new(8));
        queue.push(OrderEvent::Message { partition: "p0".to_string(), offset: 1, payload: payload("run-1") });
        queue.push(OrderEvent::EndOfStream);
        let (_tx, rx) = watch::channel(false);

        let mut consumer = OrderEventConsumer::new(InMemoryOrderStore::new());
        consumer.run(queue, rx).await;
        assert!(consumer.store().get("run-1").is_some());
    }

    #[tokio::test]
    async fn run_stops_when_shutdown_fires() {
        let queue = Arc::new(BoundedDropOldestQueue::new(8));
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let mut consumer = OrderEventConsumer::new(InMemoryOrderStore::new());
        consumer.run(queue, rx).await;
    }
}
