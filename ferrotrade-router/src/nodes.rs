use crate::priors;
use crate::synthetic::synthetic_frame;
use crate::types::{FrameSource, RiskSizing, RouterState};
use chrono::Utc;
use ferrotrade_core::{OrderIntent, Regime, RiskDecision};
use ferrotrade_risk::FractionalKellyAgent;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Synthesizes or fetches the frame a request is routed against (spec.md §4.9 `ingest_frame`).
pub fn ingest_frame(mut state: RouterState, source: &dyn FrameSource) -> RouterState {
    if state.halt {
        return state;
    }
    let end = state.request.end.unwrap_or_else(Utc::now);
    if state.context.offline_mode {
        match synthetic_frame(&state.request.symbol, state.request.start, end) {
            Some(frame) => {
                state.frame = Some(frame);
                state.events.push("ingest:synthetic".to_string());
            }
            None => {
                state.errors.push("ingest:synthetic-empty".to_string());
                state.halt = true;
                state.fallback_reason = Some("synthetic_failed".to_string());
            }
        }
        return state;
    }

    match source.fetch(&state.request) {
        Ok(frame) if !frame.is_empty() => {
            state.frame = Some(frame);
            state.events.push("ingest:dal".to_string());
        }
        Ok(_) | Err(_) => match synthetic_frame(&state.request.symbol, state.request.start, end) {
            Some(frame) => {
                state.frame = Some(frame);
                state.events.push("ingest:synthetic".to_string());
            }
            None => {
                state.errors.push("ingest:dal_ingest_failed".to_string());
                state.halt = true;
                state.fallback_reason = Some("dal_ingest_failed".to_string());
            }
        },
    }
    state
}

/// Computes win-rate/payoff priors from the last 60 bars (spec.md §4.9 `infer_priors`).
pub fn infer_priors(mut state: RouterState) -> RouterState {
    if state.halt {
        return state;
    }
    match &state.frame {
        Some(frame) if !frame.is_empty() => {
            state.priors = Some(priors::infer(frame));
            state.events.push("priors:computed".to_string());
        }
        _ => {
            state.errors.push("priors:no-frame".to_string());
            state.halt = true;
            state.fallback_reason = Some("no_frame".to_string());
        }
    }
    state
}

/// Switches a requested `breakout` run to `momentum`/`mean_reversion` when the inferred regime
/// doesn't favor a breakout (spec.md §4.9 `pick_strategy`).
pub fn pick_strategy(mut state: RouterState) -> RouterState {
    if state.halt {
        return state;
    }
    let requested = state.request.strategy.clone();
    let regime = state.priors.and_then(|p| p.regime);
    let strategy = if requested == "breakout" && matches!(regime, Some(Regime::TrendUp) | Some(Regime::TrendDown)) {
        "momentum".to_string()
    } else if requested == "breakout" && matches!(regime, Some(Regime::Sideways) | Some(Regime::Calm)) {
        "mean_reversion".to_string()
    } else {
        requested
    };
    state.events.push(format!("strategy:{strategy}"));
    state.strategy = Some(strategy);
    state
}

/// Sizes the order with the fractional Kelly agent, halting on the kill switch (spec.md §4.9
/// `risk_size`).
pub fn risk_size(mut state: RouterState) -> RouterState {
    if state.halt {
        return state;
    }
    if state.context.kill_switch_active {
        state.events.push("risk:kill_switch".to_string());
        state.halt = true;
        state.fallback_reason = Some(state.context.kill_switch_reason.clone().unwrap_or_else(|| "kill_switch".to_string()));
        return state;
    }

    let priors = state.priors.unwrap_or(crate::types::Priors {
        win_prob: 0.55,
        payoff: 1.5,
        vol_hint: 0.02,
        avg_return: 0.0,
        regime: None,
    });
    let agent = FractionalKellyAgent {
        fraction: state.context.risk_agent_fraction,
        ..FractionalKellyAgent::default()
    };
    let kelly_fraction = agent.size(priors.win_prob, priors.payoff);

    let kill_switch_notional = state.context.kill_switch_notional;
    let uncapped = Decimal::try_from(kelly_fraction).unwrap_or(Decimal::ZERO) * kill_switch_notional;
    let notional = uncapped.clamp(state.request.min_notional, state.request.max_notional);

    if notional >= kill_switch_notional {
        state.events.push("risk:kill_switch".to_string());
        state.halt = true;
        state.fallback_reason = Some("kill_switch_notional".to_string());
        return state;
    }

    state.risk = Some(RiskSizing {
        kelly_fraction,
        probability: priors.win_prob,
        payoff: priors.payoff,
        target_notional: notional,
    });
    state.events.push("risk:fractional_kelly".to_string());
    state
}

/// Builds the sized [`OrderIntent`] from the routed strategy/risk decision (spec.md §4.9
/// `enqueue_order`).
pub fn enqueue_order(mut state: RouterState) -> RouterState {
    if state.halt {
        return state;
    }
    let risk = state.risk.expect("risk_size populates risk before enqueue_order runs");
    let price = state
        .frame
        .as_ref()
        .and_then(|frame| frame.last())
        .map(|row| row.close)
        .filter(|&p| p > 0.0)
        .unwrap_or(100.0);

    let notional_f64 = risk.target_notional.to_f64().unwrap_or(0.0);
    let qty = ((notional_f64 / price.max(1e-6)).floor() as i64).max(1) as u64;

    let intent = OrderIntent {
        run_id: state.context.run_id.clone(),
        symbol: state.request.symbol.clone(),
        strategy: state.strategy.clone().unwrap_or_else(|| state.request.strategy.clone()),
        side: state.request.side,
        qty,
        notional: risk.target_notional,
        price_hint: Decimal::try_from(price).unwrap_or_default(),
        params: state.request.params.clone(),
        risk: RiskDecision {
            kelly_fraction: risk.kelly_fraction,
            probability: risk.probability,
            payoff: risk.payoff,
            target_notional: risk.target_notional,
        },
        timestamp: Utc::now(),
        broker_order_id: None,
    };
    state.order_intent = Some(intent);
    state.events.push(if state.context.publish_orders {
        "order:published".to_string()
    } else {
        "order:simulated".to_string()
    });
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RouterContext, RouterRequest, RouterRow};
    use chrono::{DateTime, Duration};
    use ferrotrade_core::{Side, Symbol};

    struct FailingSource;
    impl FrameSource for FailingSource {
        fn fetch(&self, _request: &RouterRequest) -> Result<Vec<RouterRow>, String> {
            Err("network down".to_string())
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
    fn offline_mode_ingests_a_synthetic_frame() {
        let ctx = RouterContext {
            offline_mode: true,
            ..RouterContext::default()
        };
        let state = RouterState::new(request(), ctx);
        let state = ingest_frame(state, &FailingSource);
        assert!(!state.halt);
        assert!(state.frame.is_some());
        assert_eq!(state.events, vec!["ingest:synthetic"]);
    }

    #[test]
    fn a_failing_source_falls_back_to_synthetic_rather_than_halting() {
        let state = RouterState::new(request(), RouterContext::default());
        let state = ingest_frame(state, &FailingSource);
        assert!(!state.halt);
        assert_eq!(state.fallback_reason, None);
        assert_eq!(state.events, vec!["ingest:synthetic"]);
    }

    #[test]
    fn kill_switch_active_halts_before_sizing() {
        let ctx = RouterContext {
            offline_mode: true,
            kill_switch_active: true,
            kill_switch_reason: Some("manual_halt".to_string()),
            ..RouterContext::default()
        };
        let mut state = RouterState::new(request(), ctx);
        state.priors = Some(crate::types::Priors {
            win_prob: 0.6,
            payoff: 1.5,
            vol_hint: 0.02,
            avg_return: 0.01,
            regime: Some(Regime::TrendUp),
        });
        let state = risk_size(state);
        assert!(state.halt);
        assert_eq!(state.fallback_reason, Some("manual_halt".to_string()));
        assert!(state.risk.is_none());
    }

    #[test]
    fn halted_state_passes_through_every_remaining_node_unchanged() {
        let mut state = RouterState::new(request(), RouterContext::default());
        state.halt = true;
        state.fallback_reason = Some("no_frame".to_string());
        let state = infer_priors(state);
        let state = pick_strategy(state);
        let state = risk_size(state);
        let state = enqueue_order(state);
        assert!(state.halt);
        assert_eq!(state.fallback_reason, Some("no_frame".to_string()));
        assert!(state.order_intent.is_none());
    }
}
