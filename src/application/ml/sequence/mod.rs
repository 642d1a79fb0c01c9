//! Recurrent next-close predictor.
//!
//! Two stacked LSTM layers (the first returns its full hidden sequence, the
//! second only its final state) feed a dense head that emits one normalized
//! price. Trained with mean squared error and Adam over shuffled mini-batches.

mod adam;
mod lstm;
mod network;

pub use adam::{Adam, AdamConfig};
pub use lstm::{LstmGradients, LstmLayer};
pub use network::{NetworkGradients, SequenceNetwork};

use crate::domain::errors::PredictorError;
use crate::domain::ml::WindowedDataset;
use crate::domain::ports::NextValuePredictor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const MODEL_NAME: &str = "LSTM";

/// Hyper-parameters of the sequence model and its training loop.
#[derive(Debug, Clone, Copy)]
pub struct SequenceTrainingConfig {
    pub hidden_size: usize,
    pub num_layers: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub adam: AdamConfig,
    /// Fixes weight initialisation and batch order when set.
    pub seed: Option<u64>,
}

impl Default for SequenceTrainingConfig {
    fn default() -> Self {
        Self {
            hidden_size: 50,
            num_layers: 2,
            epochs: 5,
            batch_size: 32,
            adam: AdamConfig::default(),
            seed: None,
        }
    }
}

/// Mean training loss per epoch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingHistory {
    pub epoch_losses: Vec<f64>,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f64> {
        self.epoch_losses.last().copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SequenceArtifact")]
pub struct SequencePredictor {
    window_size: usize,
    network: SequenceNetwork,
}

/// Persisted form, checked before it becomes a usable predictor.
#[derive(Deserialize)]
struct SequenceArtifact {
    window_size: usize,
    network: SequenceNetwork,
}

impl TryFrom<SequenceArtifact> for SequencePredictor {
    type Error = PredictorError;

    fn try_from(artifact: SequenceArtifact) -> Result<Self, Self::Error> {
        let invalid = |reason: String| PredictorError::InvalidArtifact {
            model: MODEL_NAME.to_string(),
            reason,
        };
        if artifact.window_size == 0 {
            return Err(invalid("window size is zero".to_string()));
        }
        artifact.network.check_shapes().map_err(invalid)?;
        Ok(Self::new(artifact.window_size, artifact.network))
    }
}

impl SequencePredictor {
    pub fn new(window_size: usize, network: SequenceNetwork) -> Self {
        Self {
            window_size,
            network,
        }
    }

    /// Fits a fresh network on normalized windows and targets.
    pub fn train(
        dataset: &WindowedDataset,
        config: &SequenceTrainingConfig,
    ) -> Result<(Self, TrainingHistory), PredictorError> {
        let window_size = match dataset.windows.first() {
            Some(w) if !w.is_empty() => w.len(),
            _ => {
                return Err(PredictorError::Training {
                    model: MODEL_NAME.to_string(),
                    reason: "empty training set".to_string(),
                });
            }
        };
        if let Some(bad) = dataset.windows.iter().find(|w| w.len() != window_size) {
            return Err(PredictorError::WindowLength {
                model: MODEL_NAME.to_string(),
                expected: window_size,
                actual: bad.len(),
            });
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut network = SequenceNetwork::new(config.hidden_size, config.num_layers, &mut rng);
        let mut optimizer = Adam::new(config.adam);
        let batch_size = config.batch_size.max(1);
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        let mut history = TrainingHistory::default();

        info!(
            "SequencePredictor: training on {} windows (hidden={}, layers={}, epochs={}, batch={})",
            dataset.len(),
            config.hidden_size,
            config.num_layers,
            config.epochs,
            batch_size
        );

        for epoch in 0..config.epochs {
            order.shuffle(&mut rng);
            let mut loss_sum = 0.0;

            for batch in order.chunks(batch_size) {
                let scale = 1.0 / batch.len() as f64;
                let net = &network;
                let (grads, batch_loss) = batch
                    .par_iter()
                    .map(|&idx| {
                        net.sample_gradients(&dataset.windows[idx], dataset.targets[idx], scale)
                    })
                    .reduce(
                        || (NetworkGradients::zeros_like(net), 0.0),
                        |(mut acc, loss_a), (g, loss_b)| {
                            acc.accumulate(&g);
                            (acc, loss_a + loss_b)
                        },
                    );

                optimizer.step(network.parameters_mut(), grads.views());
                loss_sum += batch_loss;
            }

            let epoch_loss = loss_sum / dataset.len() as f64;
            if !epoch_loss.is_finite() {
                return Err(PredictorError::Training {
                    model: MODEL_NAME.to_string(),
                    reason: format!("loss diverged at epoch {}", epoch + 1),
                });
            }
            info!(
                "SequencePredictor: epoch {}/{} - loss: {:.6}",
                epoch + 1,
                config.epochs,
                epoch_loss
            );
            history.epoch_losses.push(epoch_loss);
        }

        debug!("SequencePredictor: {} optimizer steps", optimizer.steps());
        Ok((Self::new(window_size, network), history))
    }

    pub fn predict_batch(&self, windows: &[Vec<f64>]) -> Result<Vec<f64>, PredictorError> {
        windows.par_iter().map(|w| self.predict(w)).collect()
    }
}

impl NextValuePredictor for SequencePredictor {
    fn predict(&self, window: &[f64]) -> Result<f64, PredictorError> {
        if window.len() != self.window_size {
            return Err(PredictorError::WindowLength {
                model: MODEL_NAME.to_string(),
                expected: self.window_size,
                actual: window.len(),
            });
        }
        let output = self.network.forward(window);
        if !output.is_finite() {
            return Err(PredictorError::NonFinite {
                model: MODEL_NAME.to_string(),
            });
        }
        Ok(output)
    }

    fn window_size(&self) -> usize {
        self.window_size
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::build_windows;

    fn sine_dataset(len: usize, window: usize) -> WindowedDataset {
        let series: Vec<f64> = (0..len)
            .map(|i| 0.5 + 0.4 * (i as f64 * 0.3).sin())
            .collect();
        build_windows(&series, window).unwrap()
    }

    fn small_config() -> SequenceTrainingConfig {
        SequenceTrainingConfig {
            hidden_size: 8,
            num_layers: 2,
            epochs: 8,
            batch_size: 16,
            adam: AdamConfig {
                learning_rate: 0.01,
                ..AdamConfig::default()
            },
            seed: Some(7),
        }
    }

    #[test]
    fn test_training_reduces_loss() {
        let dataset = sine_dataset(120, 10);
        let (model, history) = SequencePredictor::train(&dataset, &small_config()).unwrap();

        assert_eq!(history.epoch_losses.len(), 8);
        let first = history.epoch_losses[0];
        let last = history.final_loss().unwrap();
        assert!(last < first, "loss went from {} to {}", first, last);
        assert_eq!(model.window_size(), 10);
    }

    #[test]
    fn test_predict_rejects_wrong_window() {
        let dataset = sine_dataset(40, 10);
        let config = SequenceTrainingConfig {
            epochs: 1,
            ..small_config()
        };
        let (model, _) = SequencePredictor::train(&dataset, &config).unwrap();

        assert!(model.predict(&dataset.windows[0]).unwrap().is_finite());
        let err = model.predict(&[0.5; 9]).unwrap_err();
        assert!(matches!(
            err,
            PredictorError::WindowLength {
                expected: 10,
                actual: 9,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let result = SequencePredictor::train(&WindowedDataset::default(), &small_config());
        assert!(matches!(result, Err(PredictorError::Training { .. })));
    }

    #[test]
    fn test_default_config_matches_reference_architecture() {
        let config = SequenceTrainingConfig::default();
        assert_eq!(config.hidden_size, 50);
        assert_eq!(config.num_layers, 2);
        assert_eq!(config.epochs, 5);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.adam.learning_rate, 1e-3);
    }

    #[test]
    fn test_mismatched_artifact_is_rejected_on_load() {
        let dataset = sine_dataset(40, 10);
        let config = SequenceTrainingConfig {
            epochs: 1,
            ..small_config()
        };
        let (model, _) = SequencePredictor::train(&dataset, &config).unwrap();
        let mut json = serde_json::to_value(&model).unwrap();

        // Truncate the dense head from 8 weights to 3
        let head = &mut json["network"]["head_w"];
        head["dim"] = serde_json::json!([3]);
        let kept: Vec<serde_json::Value> =
            head["data"].as_array().unwrap().iter().take(3).cloned().collect();
        head["data"] = serde_json::Value::Array(kept);

        let err = serde_json::from_value::<SequencePredictor>(json.clone()).unwrap_err();
        assert!(err.to_string().contains("LSTM"), "{}", err);

        json["network"]["head_w"] = serde_json::to_value(ndarray::Array1::<f64>::zeros(8)).unwrap();
        json["window_size"] = serde_json::json!(0);
        assert!(serde_json::from_value::<SequencePredictor>(json).is_err());
    }

    #[test]
    fn test_serde_round_trip_preserves_predictions() {
        let dataset = sine_dataset(40, 10);
        let config = SequenceTrainingConfig {
            epochs: 1,
            ..small_config()
        };
        let (model, _) = SequencePredictor::train(&dataset, &config).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: SequencePredictor = serde_json::from_str(&json).unwrap();

        let a = model.predict(&dataset.windows[3]).unwrap();
        let b = restored.predict(&dataset.windows[3]).unwrap();
        assert!((a - b).abs() < 1e-12);
    }
}
