use crate::symbol::Symbol;
use crate::vendor::VendorId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A [`Bar`](crate::bar::Bar) enriched with causally-filtered price,
/// velocity and uncertainty (spec.md §3).
///
/// Produced 1:1 from `Bars` by the filter bank ([`ferrotrade_filters`]);
/// frame `i` depends only on frames `0..=i` (causality invariant, spec.md §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalFrame {
    pub symbol: Symbol,
    pub vendor: VendorId,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
    pub volume: f64,
    pub filtered_price: f64,
    pub velocity: f64,
    pub uncertainty: f64,
    pub butterworth_price: f64,
    pub ema_price: f64,
}

impl SignalFrame {
    /// Price used by the regime classifier: `filtered_price`, falling back
    /// to raw `price` if filtering has not produced a finite value yet
    /// (spec.md §4.3).
    pub fn regime_price(&self) -> f64 {
        if self.filtered_price.is_finite() {
            self.filtered_price
        } else {
            self.price
        }
    }
}
