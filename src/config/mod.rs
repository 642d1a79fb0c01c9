//! Configuration module for Pricecast.
//!
//! Structured configuration loading from environment variables,
//! organized by concern: Server, Market Data and Models.

mod market_data_config;
mod model_config;
mod server_config;

pub use market_data_config::MarketDataEnvConfig;
pub use model_config::{
    DEFAULT_HISTORICAL_DATA_PATH, DEFAULT_LINEAR_MODEL_PATH, DEFAULT_SCALER_PATH,
    DEFAULT_SEQUENCE_MODEL_PATH, ModelEnvConfig,
};
pub use server_config::ServerEnvConfig;

use anyhow::Result;

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server: ServerEnvConfig,
    pub market_data: MarketDataEnvConfig,
    pub models: ModelEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerEnvConfig::from_env(),
            market_data: MarketDataEnvConfig::from_env()?,
            models: ModelEnvConfig::from_env(),
        })
    }
}
