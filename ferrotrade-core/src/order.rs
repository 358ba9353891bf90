use crate::symbol::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order side. The core only ever emits `Buy` (spec.md §1: long-only scope)
/// but the type is not artificially restricted, mirroring
/// `original_source`'s `side: str = "buy"` default rather than a hard enum
/// variant count of one.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

/// Risk sizing inputs/outputs attached to an [`OrderIntent`] (spec.md §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskDecision {
    pub kelly_fraction: f64,
    pub probability: f64,
    pub payoff: f64,
    pub target_notional: Decimal,
}

/// Sized, risk-bounded order intent emitted once per router run
/// (spec.md §3, §4.9). Never mutated after construction; never replayed by
/// the producer once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    pub run_id: String,
    pub symbol: Symbol,
    pub strategy: String,
    pub side: Side,
    pub qty: u64,
    pub notional: Decimal,
    pub price_hint: Decimal,
    pub params: serde_json::Value,
    pub risk: RiskDecision,
    pub timestamp: DateTime<Utc>,
    pub broker_order_id: Option<String>,
}
