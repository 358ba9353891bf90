/// Per-fill cost assumptions (spec.md §4.7).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Costs {
    pub slippage_bps: f64,
    pub fee_per_share: f64,
}

impl Default for Costs {
    fn default() -> Self {
        Self {
            slippage_bps: 1.0,
            fee_per_share: 0.0,
        }
    }
}
