use crate::domain::errors::PredictorError;
use crate::domain::ml::WindowedDataset;
use crate::domain::ports::NextValuePredictor;
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{
    LinearRegression, LinearRegressionParameters, LinearRegressionSolverName,
};
use tracing::info;

const MODEL_NAME: &str = "Linear Regression";

type OlsModel = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Ordinary least squares over the flattened window.
#[derive(Serialize, Deserialize)]
pub struct LinearPredictor {
    window_size: usize,
    model: OlsModel,
}

impl LinearPredictor {
    /// Fits OLS with intercept and no regularization.
    ///
    /// Uses the SVD solver: adjacent closes are almost collinear, which makes
    /// the QR solver unreliable on real price data.
    pub fn fit(dataset: &WindowedDataset) -> Result<Self, PredictorError> {
        let window_size = dataset.windows.first().map(Vec::len).unwrap_or(0);
        if window_size == 0 {
            return Err(PredictorError::Training {
                model: MODEL_NAME.to_string(),
                reason: "empty training set".to_string(),
            });
        }

        info!(
            "LinearPredictor: fitting OLS on {} windows x {} features",
            dataset.len(),
            window_size
        );

        let x = DenseMatrix::from_2d_vec(&dataset.windows).map_err(|e| PredictorError::Training {
            model: MODEL_NAME.to_string(),
            reason: format!("Matrix error: {}", e),
        })?;
        let params =
            LinearRegressionParameters::default().with_solver(LinearRegressionSolverName::SVD);
        let model = LinearRegression::fit(&x, &dataset.targets, params).map_err(|e| {
            PredictorError::Training {
                model: MODEL_NAME.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self { window_size, model })
    }

    /// Predicts every window in one matrix call.
    pub fn predict_batch(&self, windows: &[Vec<f64>]) -> Result<Vec<f64>, PredictorError> {
        if let Some(bad) = windows.iter().find(|w| w.len() != self.window_size) {
            return Err(self.length_error(bad.len()));
        }
        if windows.is_empty() {
            return Ok(Vec::new());
        }
        let x = DenseMatrix::from_2d_vec(&windows.to_vec()).map_err(|e| self.inference_error(e))?;
        let predictions = self.model.predict(&x).map_err(|e| self.inference_error(e))?;
        if predictions.iter().any(|p| !p.is_finite()) {
            return Err(PredictorError::NonFinite {
                model: MODEL_NAME.to_string(),
            });
        }
        Ok(predictions)
    }

    fn length_error(&self, actual: usize) -> PredictorError {
        PredictorError::WindowLength {
            model: MODEL_NAME.to_string(),
            expected: self.window_size,
            actual,
        }
    }

    fn inference_error(&self, e: impl std::fmt::Display) -> PredictorError {
        PredictorError::Inference {
            model: MODEL_NAME.to_string(),
            reason: e.to_string(),
        }
    }
}

impl NextValuePredictor for LinearPredictor {
    fn predict(&self, window: &[f64]) -> Result<f64, PredictorError> {
        if window.len() != self.window_size {
            return Err(self.length_error(window.len()));
        }
        // 1 x W row vector
        let predictions = self.predict_batch(&[window.to_vec()])?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| self.inference_error("No prediction returned"))
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

    /// Deterministic AR(2)-like series with a little bounded noise.
    fn ar_series(len: usize) -> Vec<f64> {
        let mut series = vec![0.4, 0.45];
        for i in 2..len {
            let noise = 0.02 * ((i as f64) * 12.9898).sin();
            let next = 0.2 + 0.9 * series[i - 1] - 0.3 * series[i - 2] + noise;
            series.push(next);
        }
        series
    }

    #[test]
    fn test_fit_and_predict_in_sample() {
        let series = ar_series(300);
        let dataset = build_windows(&series, 5).unwrap();
        let model = LinearPredictor::fit(&dataset).unwrap();

        let preds = model.predict_batch(&dataset.windows).unwrap();
        let mae = preds
            .iter()
            .zip(&dataset.targets)
            .map(|(p, t)| (p - t).abs())
            .sum::<f64>()
            / preds.len() as f64;
        assert!(mae < 0.03, "in-sample MAE too large: {}", mae);

        let single = model.predict(&dataset.windows[10]).unwrap();
        assert!((single - preds[10]).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_given_identical_data() {
        let dataset = build_windows(&ar_series(120), 5).unwrap();
        let a = LinearPredictor::fit(&dataset).unwrap();
        let b = LinearPredictor::fit(&dataset).unwrap();
        let w = &dataset.windows[7];
        assert_eq!(a.predict(w).unwrap(), b.predict(w).unwrap());
    }

    #[test]
    fn test_window_length_checked() {
        let dataset = build_windows(&ar_series(60), 5).unwrap();
        let model = LinearPredictor::fit(&dataset).unwrap();
        assert_eq!(model.window_size(), 5);
        assert!(matches!(
            model.predict(&[0.1, 0.2]),
            Err(PredictorError::WindowLength {
                expected: 5,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_training_set() {
        assert!(LinearPredictor::fit(&WindowedDataset::default()).is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let dataset = build_windows(&ar_series(80), 5).unwrap();
        let model = LinearPredictor::fit(&dataset).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: LinearPredictor = serde_json::from_str(&json).unwrap();
        let w = &dataset.windows[3];
        assert!((model.predict(w).unwrap() - restored.predict(w).unwrap()).abs() < 1e-9);
    }
}
