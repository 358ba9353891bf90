use crate::costs::Costs;
use crate::trade::{EquityPoint, ExitReason, TradeRecord};
use chrono::{DateTime, Utc};

const MIN_EPS: f64 = 1e-6;

/// Which price a long entry fills at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPrice {
    /// Fill at the current bar's close.
    Close,
    /// Fill at the next bar's open, falling back to the current close on the last bar.
    NextOpen,
}

/// Which price mark-to-market unrealised PnL is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtmPrice {
    Close,
    Mid,
}

/// A gate a risk model applies to new entries, and feeds back the outcome of closed trades
/// (spec.md §4.7 "Risk model"). [`ferrotrade_risk::BetaWinRate`] implements this.
pub trait RiskModel {
    fn allow(&self) -> bool;
    fn update(&mut self, win: bool);
}

impl RiskModel for ferrotrade_risk::BetaWinRate {
    fn allow(&self) -> bool {
        ferrotrade_risk::BetaWinRate::allow(self)
    }

    fn update(&mut self, win: bool) {
        ferrotrade_risk::BetaWinRate::update(self, win)
    }
}

/// One bar's OHLC plus the strategy's entry/exit/ATR columns (spec.md §4.7 engine inputs).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub entry_event: bool,
    pub exit_event: bool,
    pub atr: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub entry_price: EntryPrice,
    pub atr_mult: f64,
    pub risk_frac: f64,
    pub costs: Costs,
    pub mark_to_market: bool,
    pub mtm_price: MtmPrice,
    pub initial_equity: f64,
    pub fractional_shares: bool,
    pub min_shares: f64,
    pub min_notional: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            entry_price: EntryPrice::Close,
            atr_mult: 2.0,
            risk_frac: 0.03,
            costs: Costs::default(),
            mark_to_market: true,
            mtm_price: MtmPrice::Close,
            initial_equity: 100_000.0,
            fractional_shares: true,
            min_shares: MIN_EPS,
            min_notional: 100.0,
        }
    }
}

impl BacktestConfig {
    /// Clamp `atr_mult`/`risk_frac` to the ranges the original engine guards against invalid
    /// configuration with (spec.md §4.7: `risk_frac ∈ (0, 0.25]`).
    fn normalised(self) -> Self {
        Self {
            atr_mult: if self.atr_mult > 0.0 { self.atr_mult } else { 2.0 },
            risk_frac: if self.risk_frac > 0.0 && self.risk_frac <= 0.25 {
                self.risk_frac
            } else {
                0.03
            },
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
}

/// Runs the long-only per-bar simulation described in spec.md §4.7: exit leg, then entry leg,
/// then risk-model accounting, then mark-to-market. Starts at index 1 (bar 0 only seeds state).
pub fn run_long_only(bars: &[BacktestBar], config: BacktestConfig, model: Option<&mut dyn RiskModel>) -> BacktestResult {
    let config = config.normalised();
    let mut model = model;

    let mut equity = config.initial_equity;
    let mut in_pos = false;
    let mut entry_px = 0.0_f64;
    let mut stop_px = 0.0_f64;
    let mut shares = 0.0_f64;
    let mut pending_outcome: Option<bool> = None;

    let mut equity_curve = Vec::with_capacity(bars.len());
    let mut trades = Vec::new();

    for i in 1..bars.len() {
        let bar = &bars[i];

        if in_pos {
            let stop_hit = bar.low <= stop_px;
            if bar.exit_event || stop_hit {
                let mut exit_px = bar.close * (1.0 - config.costs.slippage_bps / 1e4);
                if stop_hit {
                    exit_px = exit_px.min(stop_px);
                }
                let fee = shares * config.costs.fee_per_share;
                let pnl = (exit_px - entry_px) * shares - fee;
                equity += pnl;
                trades.push(TradeRecord::Exit {
                    timestamp: bar.timestamp,
                    entry_price: entry_px,
                    exit_price: exit_px,
                    shares,
                    pnl,
                    reason: if stop_hit { ExitReason::Stop } else { ExitReason::Signal },
                });
                pending_outcome = Some(pnl > 0.0);
                in_pos = false;
                shares = 0.0;
            }
        }

        if !in_pos && bar.entry_event {
            let model_ok = model.as_deref().is_none_or(|m| m.allow() || trades.is_empty());
            if model_ok {
                let mut fill_px = match config.entry_price {
                    EntryPrice::Close => bar.close,
                    EntryPrice::NextOpen => bars.get(i + 1).map(|b| b.open).unwrap_or(bar.close),
                };
                fill_px *= 1.0 + config.costs.slippage_bps / 1e4;

                let risk_dollar = equity * config.risk_frac;
                let this_atr = bar.atr.max(MIN_EPS);
                stop_px = fill_px - config.atr_mult * this_atr;
                let risk_per_share = (fill_px - stop_px).max(MIN_EPS);
                let raw_shares = risk_dollar / risk_per_share;

                shares = if config.fractional_shares {
                    let min_shares_by_notional = config.min_notional / fill_px.max(MIN_EPS);
                    raw_shares.max(config.min_shares).max(min_shares_by_notional)
                } else {
                    raw_shares.max(0.0).floor()
                };

                if shares > 0.0 {
                    equity -= shares * config.costs.fee_per_share;
                    entry_px = fill_px;
                    in_pos = true;
                    trades.push(TradeRecord::Entry {
                        timestamp: bar.timestamp,
                        price: entry_px,
                        shares,
                        stop: stop_px,
                    });
                }
            }
        }

        if let (Some(m), Some(win)) = (model.as_deref_mut(), pending_outcome.take()) {
            m.update(win);
        }

        let equity_mtm = if config.mark_to_market && in_pos && shares > 0.0 {
            let mtm_px = match config.mtm_price {
                MtmPrice::Close => bar.close,
                MtmPrice::Mid => (bar.high + bar.low) / 2.0,
            };
            equity + (mtm_px - entry_px) * shares
        } else {
            equity
        };
        equity_curve.push(EquityPoint {
            timestamp: bar.timestamp,
            equity,
            equity_mtm,
        });
    }

    BacktestResult { equity_curve, trades }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(i: i64, open: f64, high: f64, low: f64, close: f64, entry: bool, exit: bool, atr: f64) -> BacktestBar {
        BacktestBar {
            timestamp: DateTime::from_timestamp(1_700_000_000 + i * 86_400, 0).unwrap(),
            open,
            high,
            low,
            close,
            entry_event: entry,
            exit_event: exit,
            atr,
        }
    }

    #[test]
    fn entry_then_signal_exit_produces_one_round_trip() {
        let bars = vec![
            bar(0, 10.0, 10.0, 10.0, 10.0, false, false, 1.0),
            bar(1, 10.0, 10.5, 9.5, 10.0, true, false, 1.0),
            bar(2, 10.0, 11.0, 9.9, 10.8, false, false, 1.0),
            bar(3, 10.8, 11.2, 10.5, 11.0, false, true, 1.0),
        ];
        let result = run_long_only(&bars, BacktestConfig::default(), None);
        let entries = result.trades.iter().filter(|t| matches!(t, TradeRecord::Entry { .. })).count();
        let exits = result.trades.iter().filter(|t| matches!(t, TradeRecord::Exit { .. })).count();
        assert_eq!(entries, 1);
        assert_eq!(exits, 1);
        assert_eq!(result.equity_curve.len(), bars.len() - 1);
    }

    #[test]
    fn stop_loss_clamps_exit_price_to_the_stop_when_close_overshoots_it() {
        // entry fills ~10.001, stop = 10.001 - 2*atr(1.0) = 8.001. Bar 2's low (5.0) breaches the
        // stop intrabar, but its close (9.0) is still above the stop, so the clamp caps the fill
        // at the stop price rather than letting it fill at the (better) close.
        let bars = vec![
            bar(0, 10.0, 10.0, 10.0, 10.0, false, false, 1.0),
            bar(1, 10.0, 10.2, 9.9, 10.0, true, false, 1.0),
            bar(2, 10.0, 10.1, 5.0, 9.0, false, false, 1.0),
        ];
        let config = BacktestConfig {
            atr_mult: 2.0,
            ..BacktestConfig::default()
        };
        let result = run_long_only(&bars, config, None);
        let exit = result.trades.iter().find_map(|t| match t {
            TradeRecord::Exit { exit_price, reason, .. } => Some((*exit_price, *reason)),
            _ => None,
        });
        let (exit_price, reason) = exit.unwrap();
        assert_eq!(reason, ExitReason::Stop);
        assert!((exit_price - 8.001).abs() < 1e-6);
    }

    #[test]
    fn stop_loss_does_not_floor_a_gap_through_the_stop() {
        // A faithfully-transcribed property of the original formula: `min(exit_px, stop_px)`
        // only ever caps the fill from above. If price gaps straight through the stop, the fill
        // is the (worse) close, not the stop price.
        let bars = vec![
            bar(0, 10.0, 10.0, 10.0, 10.0, false, false, 1.0),
            bar(1, 10.0, 10.2, 9.9, 10.0, true, false, 1.0),
            bar(2, 10.0, 10.1, 5.0, 6.0, false, false, 1.0),
        ];
        let config = BacktestConfig {
            atr_mult: 2.0,
            ..BacktestConfig::default()
        };
        let result = run_long_only(&bars, config, None);
        let exit = result.trades.iter().find_map(|t| match t {
            TradeRecord::Exit { exit_price, reason, .. } => Some((*exit_price, *reason)),
            _ => None,
        });
        let (exit_price, reason) = exit.unwrap();
        assert_eq!(reason, ExitReason::Stop);
        assert!(exit_price < 8.001);
    }

    #[test]
    fn risk_model_blocks_a_second_entry_once_it_disallows() {
        // The model gate doesn't block the very first-ever trade (mirrors the original engine's
        // `model.allow() or len(trades) == 0`); it only has teeth from the second entry onward.
        struct AlwaysDeny;
        impl RiskModel for AlwaysDeny {
            fn allow(&self) -> bool {
                false
            }
            fn update(&mut self, _win: bool) {}
        }
        let bars = vec![
            bar(0, 10.0, 10.0, 10.0, 10.0, false, false, 1.0),
            bar(1, 10.0, 10.5, 9.5, 10.0, true, false, 1.0),
            bar(2, 10.0, 11.0, 9.9, 10.8, false, true, 1.0),
            bar(3, 10.8, 11.2, 10.5, 11.0, true, false, 1.0),
        ];
        let mut model = AlwaysDeny;
        let result = run_long_only(&bars, BacktestConfig::default(), Some(&mut model));
        let entries = result.trades.iter().filter(|t| matches!(t, TradeRecord::Entry { .. })).count();
        assert_eq!(entries, 1);
    }
}
