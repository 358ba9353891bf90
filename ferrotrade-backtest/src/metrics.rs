use crate::trade::EquityPoint;

/// Performance metrics derived from an equity curve (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub cagr: f64,
    pub max_drawdown: f64,
    pub sharpe: f64,
    pub sortino: f64,
}

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Computes [`Metrics`] from the `equity` column of a curve (spec.md §4.7 "Metrics ... derived
/// from the curve"). Empty or single-point curves yield all-zero metrics.
pub fn compute(curve: &[EquityPoint]) -> Metrics {
    if curve.len() < 2 {
        return Metrics {
            total_return: 0.0,
            cagr: 0.0,
            max_drawdown: 0.0,
            sharpe: 0.0,
            sortino: 0.0,
        };
    }

    let equity: Vec<f64> = curve.iter().map(|p| p.equity).collect();
    let returns: Vec<f64> = equity
        .windows(2)
        .map(|w| if w[0] != 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect();

    let total_return = equity[equity.len() - 1] / equity[0] - 1.0;

    let span_days = (curve[curve.len() - 1].timestamp - curve[0].timestamp).num_days() as f64;
    let years = (span_days / 365.25).max(1e-6);
    let cagr = (1.0 + total_return).powf(1.0 / years) - 1.0;

    let mut running_max = equity[0];
    let mut max_drawdown = 0.0_f64;
    for &e in &equity {
        running_max = running_max.max(e);
        let drawdown = e / running_max - 1.0;
        max_drawdown = max_drawdown.min(drawdown);
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let std = {
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
        var.sqrt()
    };
    let sharpe = (mean / (std + 1e-12)) * TRADING_DAYS_PER_YEAR.sqrt();

    let downside_std = {
        let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
        if downside.is_empty() {
            0.0
        } else {
            let downside_mean = downside.iter().sum::<f64>() / downside.len() as f64;
            (downside.iter().map(|r| (r - downside_mean).powi(2)).sum::<f64>() / downside.len() as f64).sqrt()
        }
    };
    let sortino = (mean / (downside_std + 1e-12)) * TRADING_DAYS_PER_YEAR.sqrt();

    Metrics {
        total_return,
        cagr,
        max_drawdown,
        sharpe,
        sortino,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn point(i: i64, equity: f64) -> EquityPoint {
        EquityPoint {
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000 + i * 86_400, 0).unwrap(),
            equity,
            equity_mtm: equity,
        }
    }

    #[test]
    fn flat_equity_has_zero_drawdown_and_zero_return() {
        let curve: Vec<_> = (0..120).map(|i| point(i, 100.0)).collect();
        let metrics = compute(&curve);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn monotonic_increase_has_positive_sharpe_and_no_drawdown() {
        let curve: Vec<_> = (0..252).map(|i| point(i, 100.0 + i as f64 * 0.4)).collect();
        let metrics = compute(&curve);
        assert!(metrics.sharpe > 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn a_retracement_registers_negative_drawdown() {
        let mut curve = vec![point(0, 100.0), point(1, 200.0)];
        curve.push(point(2, 90.0));
        let metrics = compute(&curve);
        assert!(metrics.max_drawdown < 0.0);
    }
}
