use crate::domain::errors::PipelineError;

/// Number of past closes fed to both predictors.
pub const WINDOW_SIZE: usize = 60;

/// Share of windows used for training; the rest is held out for evaluation.
pub const TRAIN_FRACTION: f64 = 0.8;

/// Overlapping windows paired with the value that follows each of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowedDataset {
    pub windows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl WindowedDataset {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Splits chronologically: the first `fraction` of windows train, the rest test.
    pub fn split(&self, fraction: f64) -> (WindowedDataset, WindowedDataset) {
        let at = chronological_split(self.len(), fraction);
        let train = WindowedDataset {
            windows: self.windows[..at].to_vec(),
            targets: self.targets[..at].to_vec(),
        };
        let test = WindowedDataset {
            windows: self.windows[at..].to_vec(),
            targets: self.targets[at..].to_vec(),
        };
        (train, test)
    }
}

/// Builds every `(prices[i-w..i], prices[i])` pair for `i` in `w..len`.
///
/// Needs at least `w + 1` prices so that one window has a target.
pub fn build_windows(prices: &[f64], window: usize) -> Result<WindowedDataset, PipelineError> {
    if window == 0 || prices.len() < window + 1 {
        return Err(PipelineError::InsufficientData {
            required: window + 1,
            available: prices.len(),
        });
    }

    let mut dataset = WindowedDataset {
        windows: Vec::with_capacity(prices.len() - window),
        targets: Vec::with_capacity(prices.len() - window),
    };
    for slice in prices.windows(window + 1) {
        dataset.windows.push(slice[..window].to_vec());
        dataset.targets.push(slice[window]);
    }
    Ok(dataset)
}

/// The most recent `window` prices, used as the live inference input.
pub fn latest_window(prices: &[f64], window: usize) -> Result<&[f64], PipelineError> {
    if window == 0 || prices.len() < window {
        return Err(PipelineError::InsufficientData {
            required: window,
            available: prices.len(),
        });
    }
    Ok(&prices[prices.len() - window..])
}

/// Index separating train from test when keeping time order.
pub fn chronological_split(len: usize, fraction: f64) -> usize {
    ((len as f64 * fraction.clamp(0.0, 1.0)).floor() as usize).min(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_window_count_and_alignment() {
        for n in [61, 62, 90, 250] {
            let prices = ramp(n);
            let ds = build_windows(&prices, WINDOW_SIZE).unwrap();
            assert_eq!(ds.len(), n - WINDOW_SIZE);
            for (i, (w, t)) in ds.windows.iter().zip(ds.targets.iter()).enumerate() {
                assert_eq!(w.len(), WINDOW_SIZE);
                assert_eq!(w[0], prices[i]);
                assert_eq!(*w.last().unwrap(), prices[i + WINDOW_SIZE - 1]);
                assert_eq!(*t, prices[i + WINDOW_SIZE]);
            }
        }
    }

    #[test]
    fn test_exactly_window_prices_is_insufficient_for_training() {
        let result = build_windows(&ramp(60), WINDOW_SIZE);
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientData {
                required: 61,
                available: 60
            })
        ));
    }

    #[test]
    fn test_latest_window() {
        let prices = ramp(75);
        let w = latest_window(&prices, WINDOW_SIZE).unwrap();
        assert_eq!(w.len(), 60);
        assert_eq!(w[0], 15.0);
        assert_eq!(w[59], 74.0);

        assert!(latest_window(&ramp(60), WINDOW_SIZE).is_ok());
        assert!(matches!(
            latest_window(&ramp(59), WINDOW_SIZE),
            Err(PipelineError::InsufficientData {
                required: 60,
                available: 59
            })
        ));
    }

    #[test]
    fn test_split_preserves_order() {
        let ds = build_windows(&ramp(160), WINDOW_SIZE).unwrap();
        let (train, test) = ds.split(TRAIN_FRACTION);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(train.targets.last().unwrap() + 1.0, test.targets[0]);
    }

    #[test]
    fn test_chronological_split_bounds() {
        assert_eq!(chronological_split(10, 0.8), 8);
        assert_eq!(chronological_split(7, 0.8), 5);
        assert_eq!(chronological_split(0, 0.8), 0);
        assert_eq!(chronological_split(10, 1.5), 10);
    }
}
