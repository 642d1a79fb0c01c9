pub mod context;
pub mod service;

pub use context::ModelContext;
pub use service::{PredictionResult, PredictionService};
