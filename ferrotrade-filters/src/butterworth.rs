/// 2nd-order Butterworth low-pass filter, direct-form-II-transposed difference equation
/// (spec.md §4.2). `cutoff` is a fraction of Nyquist, clamped to `(1e-5, 0.49]`.
#[derive(Debug, Clone, Copy)]
struct Coeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

fn compute_coeffs(cutoff: f64) -> Coeffs {
    let cutoff = cutoff.clamp(1e-5, 0.49);
    let ita = 1.0 / (std::f64::consts::PI * cutoff).tan();
    let sqrt2 = std::f64::consts::SQRT_2;
    let b0 = 1.0 / (1.0 + sqrt2 * ita + ita * ita);
    let b1 = 2.0 * b0;
    let b2 = b0;
    let a1 = 2.0 * (ita * ita - 1.0) / (1.0 + sqrt2 * ita + ita * ita);
    let a2 = (1.0 - sqrt2 * ita + ita * ita) / (1.0 + sqrt2 * ita + ita * ita);
    Coeffs { b0, b1, b2, a1, a2 }
}

/// Stateful 2nd-order Butterworth filter. The first two samples use degraded forms of the
/// difference equation (first sample: `b0 * price`; second sample: first-order form) since
/// the full second-order history is not yet available (spec.md §4.2).
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    coeffs: Coeffs,
    x1: Option<f64>,
    x2: Option<f64>,
    y1: Option<f64>,
    y2: Option<f64>,
}

impl ButterworthFilter {
    pub fn new(cutoff: f64, _order: u32) -> Self {
        Self {
            coeffs: compute_coeffs(cutoff),
            x1: None,
            x2: None,
            y1: None,
            y2: None,
        }
    }

    pub fn reset(&mut self) {
        self.x1 = None;
        self.x2 = None;
        self.y1 = None;
        self.y2 = None;
    }

    pub fn step(&mut self, price: f64) -> f64 {
        let Coeffs { b0, b1, b2, a1, a2 } = self.coeffs;

        let y = match (self.y1, self.y2, self.x2) {
            (None, _, _) => b0 * price,
            (Some(prev_y1), None, _) | (Some(prev_y1), _, None) => {
                let prev_x1 = self.x1.unwrap_or(price);
                b0 * price + b1 * prev_x1 - a1 * prev_y1
            }
            (Some(prev_y1), Some(prev_y2), Some(prev_x2)) => {
                let prev_x1 = self.x1.unwrap_or(price);
                b0 * price + b1 * prev_x1 + b2 * prev_x2 - a1 * prev_y1 - a2 * prev_y2
            }
        };

        self.x2 = self.x1;
        self.x1 = Some(price);
        self.y2 = self.y1;
        self.y1 = Some(y);
        y
    }
}
