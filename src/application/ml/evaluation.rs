use crate::domain::errors::PipelineError;
use crate::domain::ml::{ErrorMetrics, ScalingRange, WindowedDataset};
use crate::domain::ports::NextValuePredictor;
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

/// Held-out accuracy of both predictors, in price units.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub linear: ErrorMetrics,
    pub sequence: ErrorMetrics,
}

impl EvaluationReport {
    pub fn evaluate(
        linear: &dyn NextValuePredictor,
        sequence: &dyn NextValuePredictor,
        test: &WindowedDataset,
        range: &ScalingRange,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            linear: evaluate_predictor(linear, test, range)?,
            sequence: evaluate_predictor(sequence, test, range)?,
        })
    }
}

/// Predicts every test window, maps predictions and truth back to prices
/// through `range` and scores them.
pub fn evaluate_predictor(
    predictor: &dyn NextValuePredictor,
    test: &WindowedDataset,
    range: &ScalingRange,
) -> Result<ErrorMetrics, PipelineError> {
    let scaled: Vec<f64> = test
        .windows
        .par_iter()
        .map(|w| predictor.predict(w))
        .collect::<Result<_, _>>()?;

    let predictions = range.invert_all(&scaled);
    let actuals = range.invert_all(&test.targets);

    ErrorMetrics::compute(&predictions, &actuals).ok_or(PipelineError::InsufficientData {
        required: 1,
        available: test.len(),
    })
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Evaluated on {} held-out windows", self.linear.samples)?;
        writeln!(f, "{:<20} {:>10} {:>10} {:>8}", "Model", "MAE", "RMSE", "R2")?;
        for (name, m) in [("Linear Regression", &self.linear), ("LSTM", &self.sequence)] {
            writeln!(
                f,
                "{:<20} {:>10.4} {:>10.4} {:>8.4}",
                name, m.mae, m.rmse, m.r2
            )?;
        }
        Ok(())
    }
}
