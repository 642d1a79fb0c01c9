// Model training, evaluation and the two predictors
pub mod ml;

// Request-time inference pipeline
pub mod prediction;
