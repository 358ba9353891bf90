use crate::types::{Priors, RouterRow};

const WINDOW: usize = 60;

/// Infers win-rate/payoff priors from the trailing window of a frame (spec.md §4.9
/// `infer_priors`). Falls back to the original engine's neutral defaults
/// (`win_prob=0.55`, `vol_hint=0.02`, `avg_return=0.0`) when fewer than two rows are available
/// to form a return.
pub fn infer(frame: &[RouterRow]) -> Priors {
    let tail = &frame[frame.len().saturating_sub(WINDOW)..];
    let closes: Vec<f64> = tail.iter().map(|r| r.close).collect();
    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();

    let (win_prob, vol_hint, avg_return) = if returns.is_empty() {
        (0.55, 0.02, 0.0)
    } else {
        let wins = returns.iter().filter(|&&r| r > 0.0).count();
        let win_prob = wins as f64 / returns.len() as f64;
        let avg_return = returns.iter().sum::<f64>() / returns.len() as f64;
        let variance = returns.iter().map(|r| (r - avg_return).powi(2)).sum::<f64>() / returns.len() as f64;
        (win_prob, variance.sqrt(), avg_return)
    };

    Priors {
        win_prob: win_prob.clamp(0.05, 0.95),
        payoff: (1.0 + avg_return.abs() * 50.0).max(1.1),
        vol_hint,
        avg_return,
        regime: tail.last().and_then(|row| row.regime),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use ferrotrade_core::Regime;

    fn row(i: i64, close: f64, regime: Regime) -> RouterRow {
        RouterRow {
            timestamp: DateTime::from_timestamp(1_700_000_000 + i * 86_400, 0).unwrap(),
            close,
            velocity: None,
            regime: Some(regime),
        }
    }

    #[test]
    fn empty_frame_yields_neutral_defaults() {
        let priors = infer(&[]);
        assert_eq!(priors.win_prob, 0.55);
        assert_eq!(priors.vol_hint, 0.02);
        assert_eq!(priors.avg_return, 0.0);
    }

    #[test]
    fn steady_gains_yield_a_high_win_probability() {
        let frame: Vec<_> = (0..10).map(|i| row(i, 100.0 + i as f64, Regime::TrendUp)).collect();
        let priors = infer(&frame);
        assert!(priors.win_prob > 0.9);
        assert_eq!(priors.regime, Some(Regime::TrendUp));
    }

    #[test]
    fn win_prob_is_always_within_clamp_bounds() {
        let frame: Vec<_> = (0..10).map(|i| row(i, 100.0, Regime::Calm)).collect();
        let priors = infer(&frame);
        assert!(priors.win_prob >= 0.05 && priors.win_prob <= 0.95);
    }
}
