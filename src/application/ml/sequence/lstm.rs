use ndarray::linalg::general_mat_mul;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single LSTM layer.
///
/// Gate pre-activations are stacked in one `4H` vector ordered
/// input, forget, cell candidate, output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmLayer {
    /// Input kernel, `4H x I`.
    pub(crate) w: Array2<f64>,
    /// Recurrent kernel, `4H x H`.
    pub(crate) u: Array2<f64>,
    pub(crate) b: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct LstmGradients {
    pub(crate) w: Array2<f64>,
    pub(crate) u: Array2<f64>,
    pub(crate) b: Array1<f64>,
}

/// Activations kept from a training forward pass for backpropagation.
#[derive(Debug)]
pub struct LstmCache {
    steps: Vec<StepCache>,
}

#[derive(Debug)]
struct StepCache {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    c: Array1<f64>,
    tanh_c: Array1<f64>,
    h: Array1<f64>,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl LstmLayer {
    /// Glorot-uniform kernels, zero biases except the forget gate at 1.
    pub fn new<R: Rng>(input_size: usize, hidden_size: usize, rng: &mut R) -> Self {
        let gates = 4 * hidden_size;
        let w_limit = (6.0 / (input_size + gates) as f64).sqrt();
        let u_limit = (6.0 / (hidden_size + gates) as f64).sqrt();

        let w = Array2::from_shape_fn((gates, input_size), |_| {
            rng.random_range(-w_limit..w_limit)
        });
        let u = Array2::from_shape_fn((gates, hidden_size), |_| {
            rng.random_range(-u_limit..u_limit)
        });
        let mut b = Array1::zeros(gates);
        b.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self { w, u, b }
    }

    pub fn input_size(&self) -> usize {
        self.w.ncols()
    }

    pub fn hidden_size(&self) -> usize {
        self.u.ncols()
    }

    fn step(
        &self,
        x: ArrayView1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> StepCache {
        let hs = self.hidden_size();
        let z = self.w.dot(&x) + self.u.dot(h_prev) + &self.b;

        let i = z.slice(s![0..hs]).mapv(sigmoid);
        let f = z.slice(s![hs..2 * hs]).mapv(sigmoid);
        let g = z.slice(s![2 * hs..3 * hs]).mapv(f64::tanh);
        let o = z.slice(s![3 * hs..]).mapv(sigmoid);

        let c = &f * c_prev + &i * &g;
        let tanh_c = c.mapv(f64::tanh);
        let h = &o * &tanh_c;

        StepCache {
            x: x.to_owned(),
            h_prev: h_prev.clone(),
            c_prev: c_prev.clone(),
            i,
            f,
            g,
            o,
            c,
            tanh_c,
            h,
        }
    }

    /// Runs the layer over `xs` (`T x I`) and returns every hidden state (`T x H`).
    pub fn forward(&self, xs: ArrayView2<f64>) -> Array2<f64> {
        self.forward_train(xs).0
    }

    pub fn forward_train(&self, xs: ArrayView2<f64>) -> (Array2<f64>, LstmCache) {
        let hs = self.hidden_size();
        let mut outputs = Array2::zeros((xs.nrows(), hs));
        let mut steps = Vec::with_capacity(xs.nrows());
        let mut h = Array1::zeros(hs);
        let mut c = Array1::zeros(hs);

        for (t, x) in xs.axis_iter(Axis(0)).enumerate() {
            let step = self.step(x, &h, &c);
            outputs.row_mut(t).assign(&step.h);
            h = step.h.clone();
            c = step.c.clone();
            steps.push(step);
        }

        (outputs, LstmCache { steps })
    }

    /// Backpropagation through time.
    ///
    /// `dh_out` holds the loss gradient for each emitted hidden state (`T x H`).
    /// Returns the parameter gradients and the gradient for each input (`T x I`).
    pub fn backward(
        &self,
        cache: &LstmCache,
        dh_out: &Array2<f64>,
    ) -> (LstmGradients, Array2<f64>) {
        let hs = self.hidden_size();
        let mut grads = LstmGradients::zeros_like(self);
        let mut dx = Array2::zeros((cache.steps.len(), self.input_size()));
        let mut dh_next: Array1<f64> = Array1::zeros(hs);
        let mut dc_next: Array1<f64> = Array1::zeros(hs);

        for (t, step) in cache.steps.iter().enumerate().rev() {
            let dh = &dh_out.row(t) + &dh_next;
            let d_o = &dh * &step.tanh_c;
            let dc = &dh * &step.o * step.tanh_c.mapv(|v| 1.0 - v * v) + &dc_next;
            let di = &dc * &step.g;
            let dg = &dc * &step.i;
            let df = &dc * &step.c_prev;
            dc_next = &dc * &step.f;

            let mut dz = Array1::zeros(4 * hs);
            dz.slice_mut(s![0..hs])
                .assign(&(&di * &step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![hs..2 * hs])
                .assign(&(&df * &step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![2 * hs..3 * hs])
                .assign(&(&dg * &step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![3 * hs..])
                .assign(&(&d_o * &step.o.mapv(|v| v * (1.0 - v))));

            let dz_col = dz.view().insert_axis(Axis(1));
            let x_row = step.x.view().insert_axis(Axis(0));
            let h_row = step.h_prev.view().insert_axis(Axis(0));
            general_mat_mul(1.0, &dz_col, &x_row, 1.0, &mut grads.w);
            general_mat_mul(1.0, &dz_col, &h_row, 1.0, &mut grads.u);
            grads.b += &dz;

            dx.row_mut(t).assign(&self.w.t().dot(&dz));
            dh_next = self.u.t().dot(&dz);
        }

        (grads, dx)
    }
}

impl LstmGradients {
    pub fn zeros_like(layer: &LstmLayer) -> Self {
        Self {
            w: Array2::zeros(layer.w.raw_dim()),
            u: Array2::zeros(layer.u.raw_dim()),
            b: Array1::zeros(layer.b.raw_dim()),
        }
    }

    pub fn accumulate(&mut self, other: &LstmGradients) {
        self.w += &other.w;
        self.u += &other.u;
        self.b += &other.b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_forward_shapes_and_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = LstmLayer::new(1, 5, &mut rng);
        let xs = Array2::from_shape_fn((12, 1), |(t, _)| t as f64 / 12.0);
        let hs = layer.forward(xs.view());
        assert_eq!(hs.dim(), (12, 5));
        assert!(hs.iter().all(|h| h.abs() < 1.0));
    }

    #[test]
    fn test_forget_bias_initialised_to_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = LstmLayer::new(2, 3, &mut rng);
        assert_eq!(layer.b.slice(s![3..6]).to_vec(), vec![1.0; 3]);
        assert_eq!(layer.b.slice(s![0..3]).to_vec(), vec![0.0; 3]);
    }

    #[test]
    fn test_backward_matches_finite_differences() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut layer = LstmLayer::new(2, 3, &mut rng);
        let xs = Array2::from_shape_fn((4, 2), |(t, j)| ((t * 2 + j) as f64 * 0.37).sin());
        // Loss = sum of all hidden states weighted by a fixed pattern.
        let weights = Array2::from_shape_fn((4, 3), |(t, j)| 0.5 + 0.1 * (t + j) as f64);
        let loss = |l: &LstmLayer| (l.forward(xs.view()) * &weights).sum();

        let (_, cache) = layer.forward_train(xs.view());
        let (grads, dx) = layer.backward(&cache, &weights);

        let eps = 1e-6;
        for &(r, c) in &[(0, 0), (4, 1), (7, 0), (11, 1)] {
            let orig = layer.w[[r, c]];
            layer.w[[r, c]] = orig + eps;
            let plus = loss(&layer);
            layer.w[[r, c]] = orig - eps;
            let minus = loss(&layer);
            layer.w[[r, c]] = orig;
            let numeric = (plus - minus) / (2.0 * eps);
            assert!((numeric - grads.w[[r, c]]).abs() < 1e-6, "dW[{},{}]", r, c);
        }
        for &(r, c) in &[(1, 2), (5, 0), (9, 1), (11, 2)] {
            let orig = layer.u[[r, c]];
            layer.u[[r, c]] = orig + eps;
            let plus = loss(&layer);
            layer.u[[r, c]] = orig - eps;
            let minus = loss(&layer);
            layer.u[[r, c]] = orig;
            let numeric = (plus - minus) / (2.0 * eps);
            assert!((numeric - grads.u[[r, c]]).abs() < 1e-6, "dU[{},{}]", r, c);
        }
        for r in [0, 3, 6, 10] {
            let orig = layer.b[r];
            layer.b[r] = orig + eps;
            let plus = loss(&layer);
            layer.b[r] = orig - eps;
            let minus = loss(&layer);
            layer.b[r] = orig;
            let numeric = (plus - minus) / (2.0 * eps);
            assert!((numeric - grads.b[r]).abs() < 1e-6, "db[{}]", r);
        }

        let mut shifted = xs.clone();
        shifted[[2, 1]] += eps;
        let plus = (layer.forward(shifted.view()) * &weights).sum();
        shifted[[2, 1]] -= 2.0 * eps;
        let minus = (layer.forward(shifted.view()) * &weights).sum();
        let numeric = (plus - minus) / (2.0 * eps);
        assert!((numeric - dx[[2, 1]]).abs() < 1e-6);
    }
}
