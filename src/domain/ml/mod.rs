pub mod metrics;
pub mod scaler;
pub mod window;

pub use metrics::ErrorMetrics;
pub use scaler::ScalingRange;
pub use window::{TRAIN_FRACTION, WINDOW_SIZE, WindowedDataset, build_windows, latest_window};
