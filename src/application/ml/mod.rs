pub mod evaluation;
pub mod linear_predictor;
pub mod sequence;
pub mod training;

pub use evaluation::EvaluationReport;
pub use linear_predictor::LinearPredictor;
pub use sequence::{SequencePredictor, SequenceTrainingConfig, TrainingHistory};
pub use training::TrainingCorpus;
