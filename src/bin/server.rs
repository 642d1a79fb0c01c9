//! Pricecast Server - next-close forecasts over HTTP
//!
//! Loads the trained linear and LSTM predictors once, then serves
//! `GET /predict/{symbol}` from live daily bars.
//!
//! # Usage
//! ```sh
//! SERVER_PORT=5000 cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - listen address (default: 127.0.0.1:5000)
//! - `MARKET_DATA_TIMEOUT_MS` - market data fetch timeout (default: 5000)
//! - `LINEAR_MODEL_PATH` / `SEQUENCE_MODEL_PATH` - trained artifacts

use anyhow::{Context, Result};
use pricecast::application::ml::{LinearPredictor, SequencePredictor};
use pricecast::application::prediction::{ModelContext, PredictionService};
use pricecast::config::Config;
use pricecast::infrastructure::persistence::load_json;
use pricecast::infrastructure::yahoo::YahooMarketDataService;
use pricecast::interfaces::router;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("Pricecast Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: market data {} (range {}, timeout {:?})",
        config.market_data.base_url, config.market_data.history_range, config.market_data.timeout
    );

    info!("Loading models...");
    let linear: LinearPredictor = load_json(&config.models.linear_model_path)?;
    let sequence: SequencePredictor = load_json(&config.models.sequence_model_path)?;
    let models = ModelContext::new(Arc::new(linear), Arc::new(sequence))?;
    info!("Models loaded (window size {})", models.window_size());

    let market_data = YahooMarketDataService::builder()
        .base_url(config.market_data.base_url.clone())
        .timeout(config.market_data.timeout)
        .max_retries(config.market_data.max_retries)
        .build();

    let service = PredictionService::new(
        Arc::new(market_data),
        models,
        config.market_data.history_range,
        config.market_data.timeout,
    );

    let address = config.server.socket_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Server listening on http://{}", address);

    axum::serve(listener, router(Arc::new(service)))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received. Exiting...");
        })
        .await
        .context("HTTP server error")?;

    Ok(())
}
