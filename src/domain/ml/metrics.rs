use serde::Serialize;

/// Regression accuracy of one predictor on a held-out set, in price units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    pub samples: usize,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

impl ErrorMetrics {
    /// Computes MAE, RMSE and R² of `predictions` against `actuals`.
    ///
    /// Returns `None` when the slices are empty or of different length.
    pub fn compute(predictions: &[f64], actuals: &[f64]) -> Option<Self> {
        let n = predictions.len();
        if n == 0 || n != actuals.len() {
            return None;
        }

        let (abs_sum, sq_sum) = predictions
            .iter()
            .zip(actuals)
            .fold((0.0, 0.0), |(abs, sq), (p, a)| {
                let err = p - a;
                (abs + err.abs(), sq + err * err)
            });
        let mae = abs_sum / n as f64;
        let mse = sq_sum / n as f64;

        let mean = actuals.iter().sum::<f64>() / n as f64;
        let var = actuals.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n as f64;
        let r2 = if var > 0.0 { 1.0 - mse / var } else { 0.0 };

        Some(Self {
            samples: n,
            mae,
            rmse: mse.sqrt(),
            r2,
        })
    }
}
