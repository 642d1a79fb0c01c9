use super::lstm::{LstmGradients, LstmLayer};
use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stacked LSTM layers followed by a dense projection to one scalar.
///
/// Every layer but the last feeds its full hidden sequence to the next one;
/// the head reads only the final hidden state of the last layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceNetwork {
    layers: Vec<LstmLayer>,
    head_w: Array1<f64>,
    head_b: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct NetworkGradients {
    layers: Vec<LstmGradients>,
    head_w: Array1<f64>,
    head_b: Array1<f64>,
}

impl SequenceNetwork {
    pub fn new<R: Rng>(hidden_size: usize, num_layers: usize, rng: &mut R) -> Self {
        let num_layers = num_layers.max(1);
        let mut layers = Vec::with_capacity(num_layers);
        layers.push(LstmLayer::new(1, hidden_size, rng));
        for _ in 1..num_layers {
            layers.push(LstmLayer::new(hidden_size, hidden_size, rng));
        }

        let limit = (6.0 / (hidden_size + 1) as f64).sqrt();
        let head_w = Array1::from_shape_fn(hidden_size, |_| rng.random_range(-limit..limit));

        Self {
            layers,
            head_w,
            head_b: Array1::zeros(1),
        }
    }

    pub fn hidden_size(&self) -> usize {
        self.head_w.len()
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Checks that every tensor fits the hidden size implied by the head.
    pub fn check_shapes(&self) -> Result<(), String> {
        let hidden = self.head_w.len();
        let gates = 4 * hidden;
        if hidden == 0 {
            return Err("head has no weights".to_string());
        }
        if self.layers.is_empty() {
            return Err("network has no layers".to_string());
        }
        if self.head_b.len() != 1 {
            return Err(format!("head bias has {} values, expected 1", self.head_b.len()));
        }
        for (idx, layer) in self.layers.iter().enumerate() {
            let inputs = if idx == 0 { 1 } else { hidden };
            if layer.w.dim() != (gates, inputs) {
                return Err(format!(
                    "layer {} input kernel is {:?}, expected {:?}",
                    idx,
                    layer.w.dim(),
                    (gates, inputs)
                ));
            }
            if layer.u.dim() != (gates, hidden) {
                return Err(format!(
                    "layer {} recurrent kernel is {:?}, expected {:?}",
                    idx,
                    layer.u.dim(),
                    (gates, hidden)
                ));
            }
            if layer.b.len() != gates {
                return Err(format!(
                    "layer {} bias has {} values, expected {}",
                    idx,
                    layer.b.len(),
                    gates
                ));
            }
        }
        Ok(())
    }

    fn as_sequence(window: &[f64]) -> Array2<f64> {
        Array2::from_shape_fn((window.len(), 1), |(t, _)| window[t])
    }

    /// Predicts the value following `window` (one feature per timestep).
    pub fn forward(&self, window: &[f64]) -> f64 {
        if window.is_empty() {
            return self.head_b[0];
        }
        let mut hidden = Self::as_sequence(window);
        for layer in &self.layers {
            hidden = layer.forward(hidden.view());
        }
        let last = hidden.row(hidden.nrows() - 1);
        self.head_w.dot(&last) + self.head_b[0]
    }

    /// Squared error for one sample and its gradients scaled by `scale`.
    ///
    /// With `scale = 1 / batch_len`, summing the per-sample gradients of a batch
    /// yields the gradient of the batch mean squared error.
    pub fn sample_gradients(
        &self,
        window: &[f64],
        target: f64,
        scale: f64,
    ) -> (NetworkGradients, f64) {
        let mut grads = NetworkGradients::zeros_like(self);
        if window.is_empty() {
            return (grads, 0.0);
        }

        let mut hidden = Self::as_sequence(window);
        let mut caches = Vec::with_capacity(self.layers.len());
        for layer in &self.layers {
            let (out, cache) = layer.forward_train(hidden.view());
            caches.push(cache);
            hidden = out;
        }

        let t_last = hidden.nrows() - 1;
        let last = hidden.row(t_last);
        let prediction = self.head_w.dot(&last) + self.head_b[0];
        let error = prediction - target;
        let d_pred = 2.0 * error * scale;

        grads.head_w = last.mapv(|h| h * d_pred);
        grads.head_b[0] = d_pred;

        let mut dh_out = Array2::zeros(hidden.raw_dim());
        dh_out.row_mut(t_last).assign(&(&self.head_w * d_pred));

        for (idx, (layer, cache)) in self.layers.iter().zip(&caches).enumerate().rev() {
            let (layer_grads, dx) = layer.backward(cache, &dh_out);
            grads.layers[idx] = layer_grads;
            dh_out = dx;
        }

        (grads, error * error)
    }

    /// Mutable views of every trainable tensor, in a fixed order.
    pub fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f64>> {
        let mut params = Vec::with_capacity(self.layers.len() * 3 + 2);
        for layer in self.layers.iter_mut() {
            params.push(layer.w.view_mut().into_dyn());
            params.push(layer.u.view_mut().into_dyn());
            params.push(layer.b.view_mut().into_dyn());
        }
        params.push(self.head_w.view_mut().into_dyn());
        params.push(self.head_b.view_mut().into_dyn());
        params
    }
}

impl NetworkGradients {
    pub fn zeros_like(network: &SequenceNetwork) -> Self {
        Self {
            layers: network.layers.iter().map(LstmGradients::zeros_like).collect(),
            head_w: Array1::zeros(network.head_w.raw_dim()),
            head_b: Array1::zeros(1),
        }
    }

    pub fn accumulate(&mut self, other: &NetworkGradients) {
        for (mine, theirs) in self.layers.iter_mut().zip(&other.layers) {
            mine.accumulate(theirs);
        }
        self.head_w += &other.head_w;
        self.head_b += &other.head_b;
    }

    /// Views in the same order as [`SequenceNetwork::parameters_mut`].
    pub fn views(&self) -> Vec<ArrayViewD<'_, f64>> {
        let mut views = Vec::with_capacity(self.layers.len() * 3 + 2);
        for layer in &self.layers {
            views.push(layer.w.view().into_dyn());
            views.push(layer.u.view().into_dyn());
            views.push(layer.b.view().into_dyn());
        }
        views.push(self.head_w.view().into_dyn());
        views.push(self.head_b.view().into_dyn());
        views
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn window() -> Vec<f64> {
        (0..10).map(|i| 0.5 + 0.4 * (i as f64 * 0.6).sin()).collect()
    }

    #[test]
    fn test_stacked_shapes() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut net = SequenceNetwork::new(6, 2, &mut rng);
        assert_eq!(net.num_layers(), 2);
        assert_eq!(net.hidden_size(), 6);
        assert!(net.forward(&window()).is_finite());
        // w, u, b per layer plus the head
        assert_eq!(net.parameters_mut().len(), 8);
    }

    #[test]
    fn test_sample_gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut net = SequenceNetwork::new(4, 2, &mut rng);
        let xs = window();
        let target = 0.8;
        let loss = |n: &SequenceNetwork| (n.forward(&xs) - target).powi(2);

        let (grads, sq_err) = net.sample_gradients(&xs, target, 1.0);
        assert!((sq_err - loss(&net)).abs() < 1e-12);

        let analytic: Vec<Vec<f64>> = grads
            .views()
            .iter()
            .map(|v| v.iter().cloned().collect())
            .collect();

        // (tensor, flat index) pairs covering both layers and the head
        let samples: [(usize, usize); 8] = [
            (0, 3),
            (1, 17),
            (2, 5),
            (3, 2),
            (4, 40),
            (5, 9),
            (6, 1),
            (7, 0),
        ];
        let eps = 1e-6;
        for (tensor, index) in samples {
            let numeric = {
                let mut params = net.parameters_mut();
                let value = params[tensor].as_slice_mut().unwrap();
                let orig = value[index];
                value[index] = orig + eps;
                drop(params);
                let plus = loss(&net);
                let mut params = net.parameters_mut();
                params[tensor].as_slice_mut().unwrap()[index] = orig - eps;
                drop(params);
                let minus = loss(&net);
                let mut params = net.parameters_mut();
                params[tensor].as_slice_mut().unwrap()[index] = orig;
                (plus - minus) / (2.0 * eps)
            };
            let expected = analytic[tensor][index];
            assert!(
                (numeric - expected).abs() < 1e-6,
                "tensor {} index {}: numeric {} analytic {}",
                tensor,
                index,
                numeric,
                expected
            );
        }
    }

    #[test]
    fn test_check_shapes() {
        let mut rng = StdRng::seed_from_u64(9);
        let net = SequenceNetwork::new(5, 2, &mut rng);
        assert!(net.check_shapes().is_ok());

        let mut short_head = net.clone();
        short_head.head_w = Array1::zeros(3);
        assert!(short_head.check_shapes().is_err());

        let mut wide_input = net.clone();
        wide_input.layers[0].w = Array2::zeros((20, 5));
        let err = wide_input.check_shapes().unwrap_err();
        assert!(err.contains("layer 0 input kernel"), "{}", err);

        let mut short_bias = net;
        short_bias.layers[1].b = Array1::zeros(19);
        assert!(short_bias.check_shapes().is_err());
    }

    #[test]
    fn test_accumulate_sums_gradients() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = SequenceNetwork::new(3, 2, &mut rng);
        let (a, _) = net.sample_gradients(&window(), 0.1, 1.0);
        let mut total = NetworkGradients::zeros_like(&net);
        total.accumulate(&a);
        total.accumulate(&a);
        assert!((total.head_b[0] - 2.0 * a.head_b[0]).abs() < 1e-12);
    }
}
