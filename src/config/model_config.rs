//! Artifact and data file locations.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_LINEAR_MODEL_PATH: &str = "saved_models/linear_model.json";
pub const DEFAULT_SEQUENCE_MODEL_PATH: &str = "saved_models/lstm_model.json";
pub const DEFAULT_SCALER_PATH: &str = "saved_models/scaler.json";
pub const DEFAULT_HISTORICAL_DATA_PATH: &str = "data/stock_data.csv";

#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub linear_model_path: PathBuf,
    pub sequence_model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub historical_data_path: PathBuf,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            linear_model_path: DEFAULT_LINEAR_MODEL_PATH.into(),
            sequence_model_path: DEFAULT_SEQUENCE_MODEL_PATH.into(),
            scaler_path: DEFAULT_SCALER_PATH.into(),
            historical_data_path: DEFAULT_HISTORICAL_DATA_PATH.into(),
        }
    }
}

fn path_var(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .into()
}

impl ModelEnvConfig {
    pub fn from_env() -> Self {
        Self {
            linear_model_path: path_var("LINEAR_MODEL_PATH", DEFAULT_LINEAR_MODEL_PATH),
            sequence_model_path: path_var("SEQUENCE_MODEL_PATH", DEFAULT_SEQUENCE_MODEL_PATH),
            scaler_path: path_var("SCALER_PATH", DEFAULT_SCALER_PATH),
            historical_data_path: path_var("HISTORICAL_DATA_PATH", DEFAULT_HISTORICAL_DATA_PATH),
        }
    }
}
