use crate::domain::errors::PipelineError;
use serde::{Deserialize, Serialize};

/// Min-max normalization bounds fitted over a price sequence.
///
/// Always satisfies `max > min`; construct through [`ScalingRange::fit`] or
/// [`ScalingRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScalingBounds")]
pub struct ScalingRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct ScalingBounds {
    min: f64,
    max: f64,
}

impl TryFrom<ScalingBounds> for ScalingRange {
    type Error = PipelineError;

    fn try_from(bounds: ScalingBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.min, bounds.max)
    }
}

impl ScalingRange {
    pub fn new(min: f64, max: f64) -> Result<Self, PipelineError> {
        if !min.is_finite() || !max.is_finite() || max <= min {
            return Err(PipelineError::DegenerateRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn fit(prices: &[f64]) -> Result<Self, PipelineError> {
        if prices.is_empty() {
            return Err(PipelineError::InsufficientData {
                required: 1,
                available: 0,
            });
        }
        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        Self::new(min, max)
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    pub fn scale(&self, value: f64) -> f64 {
        (value - self.min) / self.span()
    }

    pub fn transform(&self, prices: &[f64]) -> Vec<f64> {
        prices.iter().map(|&p| self.scale(p)).collect()
    }

    pub fn invert(&self, scaled: f64) -> f64 {
        scaled * self.span() + self.min
    }

    pub fn invert_all(&self, scaled: &[f64]) -> Vec<f64> {
        scaled.iter().map(|&s| self.invert(s)).collect()
    }
}
