/// Exponential moving average filter, `alpha = 2 / (span + 1)` (spec.md §4.2). Spans `<= 1`
/// disable smoothing entirely and pass the raw price through unchanged.
#[derive(Debug, Clone)]
pub struct EmaFilter {
    alpha: Option<f64>,
    prev: Option<f64>,
}

impl EmaFilter {
    pub fn new(span: u32) -> Self {
        Self {
            alpha: (span > 1).then(|| 2.0 / (span as f64 + 1.0)),
            prev: None,
        }
    }

    pub fn reset(&mut self) {
        self.prev = None;
    }

    pub fn step(&mut self, price: f64) -> f64 {
        let Some(alpha) = self.alpha else {
            return price;
        };
        let next = match self.prev {
            None => price,
            Some(prev) => alpha * price + (1.0 - alpha) * prev,
        };
        self.prev = Some(next);
        next
    }
}
