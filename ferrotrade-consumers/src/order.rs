use crate::error::ConsumerError;
use chrono::{DateTime, Utc};
use ferrotrade_core::{OrderIntent, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Persisted view of an [`OrderIntent`] once it reaches the consumer (spec.md §4.10
/// `intent_to_order_record`). `status` is derived from whether a broker has already
/// acknowledged the order, matching the original engine's "executed"/"pending" split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub symbol: String,
    pub side: Side,
    pub order_type: String,
    pub time_in_force: String,
    pub qty: f64,
    pub filled_qty: f64,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub status: String,
    pub broker_order_id: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub raw_payload: serde_json::Value,
}

/// One simulated or broker-reported fill attached to an order (spec.md §4.10
/// `intent_to_fill_records`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillRecord {
    pub order_id: String,
    pub symbol: String,
    pub side: Side,
    pub qty: f64,
    pub price: f64,
    pub fee: Option<f64>,
    pub pnl: Option<f64>,
    pub filled_at: DateTime<Utc>,
    pub raw_payload: serde_json::Value,
}

/// Converts a routed [`OrderIntent`] into its persisted [`OrderRecord`] (spec.md §4.10).
/// Status is `"executed"` once a broker order id has been assigned, `"pending"` otherwise.
pub fn intent_to_order_record(intent: &OrderIntent) -> OrderRecord {
    OrderRecord {
        id: intent.run_id.clone(),
        symbol: intent.symbol.as_str().to_string(),
        side: intent.side,
        order_type: "market".to_string(),
        time_in_force: "day".to_string(),
        qty: intent.qty as f64,
        filled_qty: 0.0,
        limit_price: Some(intent.price_hint),
        stop_price: None,
        status: if intent.broker_order_id.is_some() { "executed" } else { "pending" }.to_string(),
        broker_order_id: intent.broker_order_id.clone(),
        submitted_at: Some(intent.timestamp),
        raw_payload: serde_json::to_value(intent).unwrap_or(serde_json::Value::Null),
    }
}

/// Extracts simulated/broker fills embedded in `intent.params["fills"]` (or
/// `"simulated_fills"`), dropping any entry with non-positive qty or price (spec.md §4.10).
pub fn intent_to_fill_records(order_id: &str, intent: &OrderIntent) -> Vec<FillRecord> {
    let fills = intent
        .params
        .get("fills")
        .or_else(|| intent.params.get("simulated_fills"))
        .and_then(|v| v.as_array());

    let Some(fills) = fills else {
        return Vec::new();
    };

    fills
        .iter()
        .filter_map(|entry| {
            let qty = entry.get("qty").or_else(|| entry.get("quantity"))?.as_f64()?;
            let price = entry.get("price").or_else(|| entry.get("fill_price"))?.as_f64()?;
            if qty <= 0.0 || price <= 0.0 {
                return None;
            }
            let filled_at = entry
                .get("filled_at")
                .and_then(|v| v.as_str())
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or(intent.timestamp);
            Some(FillRecord {
                order_id: order_id.to_string(),
                symbol: entry
                    .get("symbol")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| intent.symbol.as_str().to_string()),
                side: intent.side,
                qty,
                price,
                fee: entry.get("fee").and_then(|v| v.as_f64()),
                pnl: entry.get("pnl").and_then(|v| v.as_f64()),
                filled_at,
                raw_payload: entry.clone(),
            })
        })
        .collect()
}

/// Relational-equivalent order/fill store (spec.md §4.10). Persisting is expected to be
/// transactional per call: `upsert_orders` followed by `record_fills` under one commit.
pub trait OrderStore: Send + Sync {
    fn upsert_orders(&mut self, orders: &[OrderRecord]) -> Result<(), ConsumerError>;
    fn record_fills(&mut self, fills: &[FillRecord]) -> Result<(), ConsumerError>;
}

/// In-process order/fill store. Stands in for a real relational store (e.g. a Postgres
/// orders/fills table pair) absent from this build's dependency stack — see DESIGN.md.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: HashMap<String, OrderRecord>,
    fills: Vec<FillRecord>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&OrderRecord> {
        self.orders.get(id)
    }

    pub fn fills(&self) -> &[FillRecord] {
        &self.fills
    }
}

impl OrderStore for InMemoryOrderStore {
    fn upsert_orders(&mut self, orders: &[OrderRecord]) -> Result<(), ConsumerError> {
        for order in orders {
            self.orders.insert(order.id.clone(), order.clone());
        }
        Ok(())
    }

    fn record_fills(&mut self, fills: &[FillRecord]) -> Result<(), ConsumerError> {
        self.fills.extend_from_slice(fills);
        Ok(())
    }
}

/// Persists `order` and any `fills` together, matching the original engine's
/// upsert-then-commit sequencing (spec.md §4.10).
pub fn persist_order_payload(store: &mut dyn OrderStore, order: OrderRecord, fills: Vec<FillRecord>) -> Result<(), ConsumerError> {
    let run_id = order.id.clone();
    store.upsert_orders(std::slice::from_ref(&order)).map_err(|_| ConsumerError::Persist {
        run_id: run_id.clone(),
        reason: "upsert_orders failed".to_string(),
    })?;
    if !fills.is_empty() {
        store.record_fills(&fills).map_err(|_| ConsumerError::Persist {
            run_id,
            reason: "record_fills failed".to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferrotrade_core::{RiskDecision, Symbol};

    fn intent(broker_order_id: Option<String>, params: serde_json::Value) -> OrderIntent {
        OrderIntent {
            run_id: "run-1".to_string(),
            symbol: Symbol::new("AAPL"),
            strategy: "breakout".to_string(),
            side: Side::Buy,
            qty: 10,
            notional: Decimal::from(1_000),
            price_hint: Decimal::from(100),
            params,
            risk: RiskDecision {
                kelly_fraction: 0.02,
                probability: 0.6,
                payoff: 1.5,
                target_notional: Decimal::from(1_000),
            },
            timestamp: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            broker_order_id,
        }
    }

    #[test]
    fn an_intent_with_no_broker_id_is_pending() {
        let record = intent_to_order_record(&intent(None, serde_json::json!({})));
        assert_eq!(record.status, "pending");
    }

    #[test]
    fn an_intent_with_a_broker_id_is_executed() {
        let record = intent_to_order_record(&intent(Some("b-1".to_string()), serde_json::json!({})));
        assert_eq!(record.status, "executed");
    }

    #[test]
    fn fills_with_non_positive_qty_or_price_are_dropped() {
        let params = serde_json::json!({
            "fills": [
                {"qty": 5.0, "price": 101.0},
                {"qty": 0.0, "price": 100.0},
                {"qty": 3.0, "price": -1.0},
            ]
        });
        let fills = intent_to_fill_records("run-1", &intent(None, params));
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].qty, 5.0);
    }

    #[test]
    fn persist_order_payload_stores_the_order_and_its_fills() {
        let mut store = InMemoryOrderStore::new();
        let params = serde_json::json!({"fills": [{"qty": 2.0, "price": 50.0}]});
        let intent = intent(None, params);
        let order = intent_to_order_record(&intent);
        let fills = intent_to_fill_records(&order.id, &intent);
        persist_order_payload(&mut store, order, fills).unwrap();
        assert!(store.get("run-1").is_some());
        assert_eq!(store.fills().len(), 1);
    }
}
