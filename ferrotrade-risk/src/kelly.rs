/// Fractional Kelly position sizer (spec.md §4.7 "Fractional Kelly agent").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalKellyAgent {
    pub fraction: f64,
    pub min_fraction: f64,
    pub max_fraction: f64,
}

impl Default for FractionalKellyAgent {
    fn default() -> Self {
        Self {
            fraction: 0.5,
            min_fraction: 0.0025,
            max_fraction: 0.05,
        }
    }
}

impl FractionalKellyAgent {
    pub fn new(fraction: f64, min_fraction: f64, max_fraction: f64) -> Self {
        Self {
            fraction,
            min_fraction,
            max_fraction,
        }
    }

    /// `scaled = clamp((prob*(payoff+1)-1)/payoff * fraction, [min_f, max_f])` (spec.md §4.7).
    pub fn size(&self, probability: f64, payoff: f64) -> f64 {
        let prob = probability.clamp(0.01, 0.99);
        let payoff = payoff.max(0.01);
        let edge = prob * (payoff + 1.0) - 1.0;
        let kelly = edge / payoff;
        let scaled = kelly * self.fraction;
        scaled.clamp(self.min_fraction, self.max_fraction)
    }
}
