#![forbid(unsafe_code)]

//! Linear orchestration state graph (C9): `ingest_frame -> infer_priors -> pick_strategy ->
//! risk_size -> enqueue_order -> END`. Each node checks `RouterState::halt` at entry and passes
//! the state through unchanged once it is set (spec.md §4.9).

pub mod nodes;
pub mod priors;
pub mod synthetic;
pub mod types;

pub use synthetic::synthetic_frame;
pub use types::{FrameSource, Priors, RiskSizing, RouterContext, RouterRequest, RouterRow, RouterState};

use std::time::Instant;

/// Runs the full 5-node graph against `request`/`context`, fetching live bars from `source`
/// when not in offline mode.
pub fn run(request: RouterRequest, context: RouterContext, source: &dyn FrameSource) -> RouterState {
    let start = Instant::now();
    let state = RouterState::new(request, context);
    let state = nodes::ingest_frame(state, source);
    let state = nodes::infer_priors(state);
    let state = nodes::pick_strategy(state);
    let state = nodes::risk_size(state);
    let mut state = nodes::enqueue_order(state);
    state.latency_ms = Some(start.elapsed().as_secs_f64() * 1000.0);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration};
    use ferrotrade_core::{Side, Symbol};
    use rust_decimal::Decimal;

    struct NoSource;
    impl FrameSource for NoSource {
        fn fetch(&self, _request: &RouterRequest) -> Result<Vec<RouterRow>, String> {
            Err("no live source configured in offline test".to_string())
        }
    }

    fn request() -> RouterRequest {
        RouterRequest {
            symbol: Symbol::new("AAPL"),
            start: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            end: Some(DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::days(90)),
            strategy: "breakout".to_string(),
            params: serde_json::json!({}),
            min_notional: Decimal::from(100),
            max_notional: Decimal::from(5_000),
            side: Side::Buy,
        }
    }

    #[test]
    fn an_offline_run_produces_an_order_intent_with_recorded_latency() {
        let ctx = RouterContext {
            offline_mode: true,
            ..RouterContext::default()
        };
        let state = run(request(), ctx, &NoSource);
        assert!(!state.halt);
        assert!(state.order_intent.is_some());
        assert!(state.latency_ms.unwrap() >= 0.0);
    }

    #[test]
    fn kill_switch_halts_before_an_order_is_enqueued() {
        let ctx = RouterContext {
            offline_mode: true,
            kill_switch_active: true,
            kill_switch_reason: Some("manual_halt".to_string()),
            ..RouterContext::default()
        };
        let state = run(request(), ctx, &NoSource);
        assert!(state.halt);
        assert_eq!(state.fallback_reason, Some("manual_halt".to_string()));
        assert!(state.order_intent.is_none());
    }

    #[test]
    fn trend_up_regime_switches_a_requested_breakout_to_momentum() {
        let ctx = RouterContext {
            offline_mode: true,
            ..RouterContext::default()
        };
        let state = run(request(), ctx, &NoSource);
        assert_eq!(state.strategy.as_deref(), Some("momentum"));
    }
}
