use chrono::{DateTime, Utc};
use ferrotrade_core::{OrderIntent, Regime, Side, Symbol};
use rust_decimal::Decimal;

/// One request into the orchestration graph (spec.md §4.9).
#[derive(Debug, Clone)]
pub struct RouterRequest {
    pub symbol: Symbol,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub strategy: String,
    pub params: serde_json::Value,
    pub min_notional: Decimal,
    pub max_notional: Decimal,
    pub side: Side,
}

/// Run-scoped configuration shared across every node (spec.md §4.9).
#[derive(Debug, Clone)]
pub struct RouterContext {
    pub run_id: String,
    pub offline_mode: bool,
    pub publish_orders: bool,
    pub kill_switch_active: bool,
    pub kill_switch_reason: Option<String>,
    pub kill_switch_notional: Decimal,
    pub risk_agent_fraction: f64,
}

impl Default for RouterContext {
    fn default() -> Self {
        Self {
            run_id: String::new(),
            offline_mode: false,
            publish_orders: false,
            kill_switch_active: false,
            kill_switch_reason: None,
            kill_switch_notional: Decimal::from(10_000),
            risk_agent_fraction: 0.5,
        }
    }
}

/// One bar of the frame a request is routed against: OHLC-derived close plus whatever
/// probabilistic columns are available (spec.md §4.9 `ingest_frame`/`infer_priors`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouterRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub velocity: Option<f64>,
    pub regime: Option<Regime>,
}

/// Win-rate/payoff priors inferred from the trailing window of a frame (spec.md §4.9
/// `infer_priors`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Priors {
    pub win_prob: f64,
    pub payoff: f64,
    pub vol_hint: f64,
    pub avg_return: f64,
    pub regime: Option<Regime>,
}

/// The sizing decision attached to a routed order (spec.md §4.9 `risk_size`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskSizing {
    pub kelly_fraction: f64,
    pub probability: f64,
    pub payoff: f64,
    pub target_notional: Decimal,
}

/// Shared state threaded through every node of the graph (spec.md §4.9 `RouterState`).
/// `halt` is a terminal short-circuit: once set, every remaining node is a no-op.
#[derive(Debug, Clone)]
pub struct RouterState {
    pub request: RouterRequest,
    pub context: RouterContext,
    pub events: Vec<String>,
    pub errors: Vec<String>,
    pub frame: Option<Vec<RouterRow>>,
    pub priors: Option<Priors>,
    pub strategy: Option<String>,
    pub risk: Option<RiskSizing>,
    pub order_intent: Option<OrderIntent>,
    pub halt: bool,
    pub latency_ms: Option<f64>,
    pub fallback_reason: Option<String>,
}

impl RouterState {
    pub fn new(request: RouterRequest, context: RouterContext) -> Self {
        Self {
            request,
            context,
            events: Vec::new(),
            errors: Vec::new(),
            frame: None,
            priors: None,
            strategy: None,
            risk: None,
            order_intent: None,
            halt: false,
            latency_ms: None,
            fallback_reason: None,
        }
    }
}

/// Supplies the OHLC+probabilistic frame a request is routed against when not running in
/// offline mode (spec.md §4.9 `ingest_frame`: "Else call DAL.FetchBars"). Kept behind a trait
/// so the graph doesn't need a hard dependency on the vendor/DAL stack to be tested.
pub trait FrameSource {
    fn fetch(&self, request: &RouterRequest) -> Result<Vec<RouterRow>, String>;
}
