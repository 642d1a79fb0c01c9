use ndarray::{ArrayD, ArrayViewD, ArrayViewMutD, Zip};

/// Adam optimizer hyper-parameters.
#[derive(Debug, Clone, Copy)]
pub struct AdamConfig {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

/// Adam (Adaptive Moment Estimation) over a fixed, ordered list of parameter tensors.
///
/// Moment buffers are created on the first step from the gradient shapes; the
/// parameter order must stay the same for the lifetime of the optimizer.
pub struct Adam {
    config: AdamConfig,
    t: i32,
    moments: Vec<(ArrayD<f64>, ArrayD<f64>)>,
}

impl Adam {
    pub fn new(config: AdamConfig) -> Self {
        Self {
            config,
            t: 0,
            moments: Vec::new(),
        }
    }

    pub fn steps(&self) -> i32 {
        self.t
    }

    pub fn step(
        &mut self,
        params: Vec<ArrayViewMutD<'_, f64>>,
        grads: Vec<ArrayViewD<'_, f64>>,
    ) {
        if self.moments.is_empty() {
            self.moments = grads
                .iter()
                .map(|g| (ArrayD::zeros(g.raw_dim()), ArrayD::zeros(g.raw_dim())))
                .collect();
        }
        debug_assert_eq!(params.len(), self.moments.len());

        self.t += 1;
        let AdamConfig {
            learning_rate,
            beta1,
            beta2,
            epsilon,
        } = self.config;
        let lr_t =
            learning_rate * (1.0 - beta2.powi(self.t)).sqrt() / (1.0 - beta1.powi(self.t));

        let pairs = params.into_iter().zip(grads);
        for ((param, grad), (m, v)) in pairs.zip(self.moments.iter_mut()) {
            Zip::from(param)
                .and(m)
                .and(v)
                .and(&grad)
                .for_each(|p, m, v, &g| {
                    *m = beta1 * *m + (1.0 - beta1) * g;
                    *v = beta2 * *v + (1.0 - beta2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + epsilon);
                });
        }
    }
}
