use super::context::ModelContext;
use crate::domain::errors::PipelineError;
use crate::domain::market::{HistoryRange, PriceSeries};
use crate::domain::ml::{ScalingRange, latest_window};
use crate::domain::ports::MarketDataService;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Next-close forecasts of both predictors for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub symbol: String,
    #[serde(rename = "linear_prediction")]
    pub linear_price: f64,
    #[serde(rename = "lstm_prediction")]
    pub sequence_price: f64,
}

/// Runs the single-pass inference pipeline:
/// fetch, validate, normalize, predict with both models, denormalize.
pub struct PredictionService {
    market_data: Arc<dyn MarketDataService>,
    models: ModelContext,
    history: HistoryRange,
    fetch_timeout: Duration,
}

impl PredictionService {
    pub fn new(
        market_data: Arc<dyn MarketDataService>,
        models: ModelContext,
        history: HistoryRange,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            market_data,
            models,
            history,
            fetch_timeout,
        }
    }

    pub async fn predict(&self, symbol: &str) -> Result<PredictionResult, PipelineError> {
        let symbol = symbol.trim().to_uppercase();
        let series = self.load_series(&symbol).await?;

        let closes = series.closes();
        let window = latest_window(&closes, self.models.window_size())?;
        let range = ScalingRange::fit(window)?;
        let normalized = range.transform(window);

        let linear = self.models.linear().predict(&normalized)?;
        let sequence = self.models.sequence().predict(&normalized)?;

        let result = PredictionResult {
            symbol,
            linear_price: round_cents(range.invert(linear)),
            sequence_price: round_cents(range.invert(sequence)),
        };
        info!(
            "PredictionService: {} -> linear {:.2}, lstm {:.2}",
            result.symbol, result.linear_price, result.sequence_price
        );
        Ok(result)
    }

    async fn load_series(&self, symbol: &str) -> Result<PriceSeries, PipelineError> {
        let fetch = self.market_data.fetch_daily_bars(symbol, self.history);
        let table = match tokio::time::timeout(self.fetch_timeout, fetch).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "PredictionService: market data for {} timed out after {:?}",
                    symbol, self.fetch_timeout
                );
                return Err(PipelineError::FetchTimeout {
                    timeout_ms: self.fetch_timeout.as_millis() as u64,
                });
            }
        };

        let series = PriceSeries::from_raw(symbol, &table)?;
        debug!(
            "PredictionService: {} valid closes for {} ({} raw rows)",
            series.len(),
            symbol,
            table.rows.len()
        );
        Ok(series)
    }
}

fn round_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}
