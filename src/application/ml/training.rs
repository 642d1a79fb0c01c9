use crate::domain::errors::PipelineError;
use crate::domain::market::PriceSeries;
use crate::domain::ml::{ScalingRange, WindowedDataset, build_windows};
use tracing::info;

/// A cleaned price history scaled with one global range and cut into windows.
///
/// Shared preamble of the training and evaluation jobs.
#[derive(Debug, Clone)]
pub struct TrainingCorpus {
    range: ScalingRange,
    dataset: WindowedDataset,
}

impl TrainingCorpus {
    /// Fits the scaling range on the whole series, then windows it.
    pub fn prepare(series: PriceSeries, window: usize) -> Result<Self, PipelineError> {
        let range = ScalingRange::fit(&series.closes())?;
        Self::with_range(series, range, window)
    }

    /// Windows the series using an already fitted range, e.g. the one persisted
    /// by a training run.
    pub fn with_range(
        series: PriceSeries,
        range: ScalingRange,
        window: usize,
    ) -> Result<Self, PipelineError> {
        let scaled = range.transform(&series.closes());
        let dataset = build_windows(&scaled, window)?;

        info!(
            "TrainingCorpus: {} closes for {} -> {} windows (range {:.2}..{:.2})",
            series.len(),
            series.symbol(),
            dataset.len(),
            range.min(),
            range.max()
        );

        Ok(Self {
            range,
            dataset,
        })
    }

    pub fn range(&self) -> ScalingRange {
        self.range
    }

    pub fn dataset(&self) -> &WindowedDataset {
        &self.dataset
    }

    /// Chronological train/test split of the windows.
    pub fn split(&self, fraction: f64) -> (WindowedDataset, WindowedDataset) {
        self.dataset.split(fraction)
    }

    /// Windows used for fitting: everything when `no_split`, else the first `fraction`.
    pub fn training_set(&self, fraction: f64, no_split: bool) -> WindowedDataset {
        if no_split {
            self.dataset.clone()
        } else {
            self.split(fraction).0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::market::PricePoint;
    use crate::domain::ml::TRAIN_FRACTION;

    fn series(closes: &[f64]) -> PriceSeries {
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: 86_400 * i as i64,
                close,
            })
            .collect();
        PriceSeries::from_points("AAPL", points)
    }

    #[test]
    fn test_prepare_scales_with_global_range() {
        let closes: Vec<f64> = (0..100).map(|i| 100.0 + i as f64).collect();
        let corpus = TrainingCorpus::prepare(series(&closes), 10).unwrap();

        assert_eq!(corpus.range().min(), 100.0);
        assert_eq!(corpus.range().max(), 199.0);
        assert_eq!(corpus.dataset().len(), 90);
        assert_eq!(corpus.dataset().windows[0][0], 0.0);
        assert_eq!(*corpus.dataset().targets.last().unwrap(), 1.0);
    }

    #[test]
    fn test_split_keeps_time_order() {
        let closes: Vec<f64> = (0..110).map(|i| (i as f64 * 0.1).sin() + 2.0).collect();
        let corpus = TrainingCorpus::prepare(series(&closes), 10).unwrap();
        let (train, test) = corpus.split(TRAIN_FRACTION);

        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(train.targets[..], corpus.dataset().targets[..80]);
        assert_eq!(test.targets[0], corpus.dataset().targets[80]);
    }

    #[test]
    fn test_no_split_trains_on_everything() {
        let closes: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let corpus = TrainingCorpus::prepare(series(&closes), 10).unwrap();
        assert_eq!(corpus.training_set(TRAIN_FRACTION, true).len(), 40);
        assert_eq!(corpus.training_set(TRAIN_FRACTION, false).len(), 32);
    }

    #[test]
    fn test_short_or_flat_history_is_rejected() {
        let short: Vec<f64> = (0..60).map(|i| i as f64).collect();
        assert!(matches!(
            TrainingCorpus::prepare(series(&short), 60),
            Err(PipelineError::InsufficientData {
                required: 61,
                available: 60
            })
        ));
        assert!(matches!(
            TrainingCorpus::prepare(series(&[5.0; 80]), 60),
            Err(PipelineError::DegenerateRange { .. })
        ));
    }
}
