use crate::domain::ports::NextValuePredictor;
use anyhow::{Result, bail};
use std::sync::Arc;

/// Trained predictors loaded once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct ModelContext {
    linear: Arc<dyn NextValuePredictor>,
    sequence: Arc<dyn NextValuePredictor>,
}

impl ModelContext {
    /// Both predictors must consume windows of the same length.
    pub fn new(
        linear: Arc<dyn NextValuePredictor>,
        sequence: Arc<dyn NextValuePredictor>,
    ) -> Result<Self> {
        if linear.window_size() != sequence.window_size() {
            bail!(
                "Window size mismatch: {} expects {}, {} expects {}",
                linear.name(),
                linear.window_size(),
                sequence.name(),
                sequence.window_size()
            );
        }
        if linear.window_size() == 0 {
            bail!("Predictors must expect a non-empty window");
        }
        Ok(Self { linear, sequence })
    }

    pub fn linear(&self) -> &dyn NextValuePredictor {
        self.linear.as_ref()
    }

    pub fn sequence(&self) -> &dyn NextValuePredictor {
        self.sequence.as_ref()
    }

    pub fn window_size(&self) -> usize {
        self.linear.window_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PredictorError;

    struct Fixed(usize);

    impl NextValuePredictor for Fixed {
        fn predict(&self, _window: &[f64]) -> Result<f64, PredictorError> {
            Ok(0.5)
        }

        fn window_size(&self) -> usize {
            self.0
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_window_sizes_must_agree() {
        assert!(ModelContext::new(Arc::new(Fixed(60)), Arc::new(Fixed(30))).is_err());
        assert!(ModelContext::new(Arc::new(Fixed(0)), Arc::new(Fixed(0))).is_err());

        let ctx = ModelContext::new(Arc::new(Fixed(60)), Arc::new(Fixed(60))).unwrap();
        assert_eq!(ctx.window_size(), 60);
        assert_eq!(ctx.linear().name(), "fixed");
    }
}
