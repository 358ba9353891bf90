/// Configuration for a constant-velocity 1-D Kalman filter (spec.md §4.2).
#[derive(Debug, Clone, Copy)]
pub struct KalmanConfig {
    pub process_variance: f64,
    pub measurement_variance: f64,
    pub dt: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            process_variance: 1e-3,
            measurement_variance: 1e-2,
            dt: 1.0,
        }
    }
}

/// Constant-velocity Kalman filter tracking price (`x`) and velocity (`v`), with a 2x2
/// covariance `P` (spec.md §4.2). The first observation initializes `x = price, v = 0` and
/// returns `(price, 0, P11)` directly; subsequent steps predict then update.
#[derive(Debug, Clone)]
pub struct KalmanFilter1D {
    q: f64,
    r: f64,
    dt: f64,
    x: f64,
    v: f64,
    p11: f64,
    p12: f64,
    p21: f64,
    p22: f64,
    initialized: bool,
}

impl KalmanFilter1D {
    pub fn new(config: KalmanConfig) -> Self {
        Self {
            q: config.process_variance,
            r: config.measurement_variance,
            dt: config.dt,
            x: 0.0,
            v: 0.0,
            p11: 1.0,
            p12: 0.0,
            p21: 0.0,
            p22: 1.0,
            initialized: false,
        }
    }

    /// Discard accumulated state, as if freshly constructed.
    pub fn reset(&mut self) {
        self.x = 0.0;
        self.v = 0.0;
        self.p11 = 1.0;
        self.p12 = 0.0;
        self.p21 = 0.0;
        self.p22 = 1.0;
        self.initialized = false;
    }

    /// Consume one price observation, returning `(filtered_price, velocity, uncertainty)`.
    pub fn step(&mut self, price: f64) -> (f64, f64, f64) {
        if !self.initialized {
            self.x = price;
            self.v = 0.0;
            self.initialized = true;
            return (price, 0.0, self.p11);
        }

        let x_pred = self.x + self.v * self.dt;
        let v_pred = self.v;
        let p11_pred = self.p11 + (self.p12 + self.p21 + self.p22 * self.dt) * self.dt + self.q;
        let p12_pred = self.p12 + self.p22 * self.dt;
        let p21_pred = self.p21 + self.p22 * self.dt;
        let p22_pred = self.p22 + self.q;

        let y = price - x_pred;
        let s = p11_pred + self.r;
        let k1 = p11_pred / s;
        let k2 = p21_pred / s;

        self.x = x_pred + k1 * y;
        self.v = v_pred + k2 * y;
        self.p11 = (1.0 - k1) * p11_pred;
        self.p12 = (1.0 - k1) * p12_pred;
        self.p21 = p21_pred - k2 * p11_pred;
        self.p22 = p22_pred - k2 * p12_pred;

        (self.x, self.v, self.p11.max(0.0))
    }
}
