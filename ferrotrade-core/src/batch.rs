use crate::bar::Bars;
use crate::regime::RegimeSnapshot;
use crate::signal::SignalFrame;
use std::collections::HashMap;
use std::path::PathBuf;

/// Synchronous triple `(bars, signals, regimes)` produced by the DAL façade
/// (spec.md §3, §4.5).
///
/// Invariant (spec.md §8.3 — length coherence):
/// `signals.len() == bars.len() == regimes.len()`.
#[derive(Debug, Clone)]
pub struct ProbabilisticBatch {
    pub bars: Bars,
    pub signals: Vec<SignalFrame>,
    pub regimes: Vec<RegimeSnapshot>,
    pub cache_paths: HashMap<String, PathBuf>,
}

impl ProbabilisticBatch {
    pub fn new(bars: Bars, signals: Vec<SignalFrame>, regimes: Vec<RegimeSnapshot>) -> Self {
        debug_assert_eq!(signals.len(), bars.len());
        debug_assert_eq!(regimes.len(), signals.len());
        Self {
            bars,
            signals,
            regimes,
            cache_paths: HashMap::new(),
        }
    }

    /// Length-coherence check (spec.md §8.3), callable outside debug builds.
    pub fn is_coherent(&self) -> bool {
        self.signals.len() == self.bars.len() && self.regimes.len() == self.signals.len()
    }
}

/// One frame of a live [`ProbabilisticBatch`] stream (spec.md §4.4).
#[derive(Debug, Clone)]
pub struct ProbabilisticStreamFrame {
    pub signal: SignalFrame,
    pub regime: RegimeSnapshot,
}
