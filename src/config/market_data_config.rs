//! Market data provider configuration parsing from environment variables.

use crate::domain::market::{HistoryRange, Period};
use crate::domain::ml::WINDOW_SIZE;
use anyhow::{Context, Result, bail};
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MarketDataEnvConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// History requested per prediction.
    pub history_range: HistoryRange,
    /// Transient-failure retries; 0 disables the retry middleware.
    pub max_retries: u32,
}

impl Default for MarketDataEnvConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout: Duration::from_millis(5000),
            history_range: HistoryRange::Period(Period::ThreeMonths),
            max_retries: 0,
        }
    }
}

impl MarketDataEnvConfig {
    pub fn from_env() -> Result<Self> {
        let period_str =
            env::var("MARKET_DATA_HISTORY_RANGE").unwrap_or_else(|_| "3mo".to_string());
        let period = Period::from_str(&period_str)
            .context("Failed to parse MARKET_DATA_HISTORY_RANGE")?;
        if period == Period::OneMonth {
            bail!(
                "MARKET_DATA_HISTORY_RANGE={} cannot supply {} daily closes; use 3mo or longer",
                period_str,
                WINDOW_SIZE
            );
        }

        Ok(Self {
            base_url: env::var("MARKET_DATA_BASE_URL")
                .unwrap_or_else(|_| "https://query1.finance.yahoo.com".to_string()),
            timeout: Duration::from_millis(
                env::var("MARKET_DATA_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".to_string())
                    .parse::<u64>()
                    .unwrap_or(5000),
            ),
            history_range: HistoryRange::Period(period),
            max_retries: env::var("MARKET_DATA_MAX_RETRIES")
                .unwrap_or_else(|_| "0".to_string())
                .parse::<u32>()
                .unwrap_or(0),
        })
    }
}
