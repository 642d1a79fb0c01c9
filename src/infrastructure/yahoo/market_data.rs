use super::common::{ChartResponse, ChartResult, YahooBar};
use crate::domain::errors::MarketDataError;
use crate::domain::market::{HistoryRange, RawTable};
use crate::domain::ports::MarketDataService;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, build_url_with_query, encode_component,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

// ===== Market Data Service (v8 chart endpoint) =====

pub struct YahooMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooMarketDataService {
    pub fn builder() -> YahooMarketDataServiceBuilder {
        YahooMarketDataServiceBuilder::default()
    }

    fn chart_url(&self, symbol: &str, range: HistoryRange) -> String {
        let base = format!(
            "{}/v8/finance/chart/{}",
            self.base_url.trim_end_matches('/'),
            encode_component(symbol)
        );
        let mut params: Vec<(&str, String)> = Vec::with_capacity(4);
        match range {
            HistoryRange::Period(period) => params.push(("range", period.as_str().to_string())),
            HistoryRange::Since(date) => {
                let start = date.and_hms_opt(0, 0, 0).map(|d| d.and_utc().timestamp());
                params.push(("period1", start.unwrap_or(0).to_string()));
                params.push(("period2", Utc::now().timestamp().to_string()));
            }
        }
        params.push(("interval", "1d".to_string()));
        params.push(("events", "history".to_string()));
        build_url_with_query(&base, &params)
    }

    /// Fetches the chart for `symbol`. `Ok(None)` when the provider knows no such symbol.
    async fn fetch_chart(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Option<ChartResult>, MarketDataError> {
        let url = self.chart_url(symbol, range);
        debug!("YahooMarketDataService: GET {}", url);

        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|e| MarketDataError::RequestFailed {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            info!("YahooMarketDataService: no chart for {}", symbol);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                "YahooMarketDataService: {} returned {} - {}",
                symbol, status, body
            );
            return Err(MarketDataError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body: ChartResponse =
            response
                .json()
                .await
                .map_err(|e| MarketDataError::InvalidData {
                    symbol: symbol.to_string(),
                    reason: e.to_string(),
                })?;

        if let Some(err) = &body.chart.error {
            debug!(
                "YahooMarketDataService: {} chart error {} ({})",
                symbol,
                err.code,
                err.description.as_deref().unwrap_or("")
            );
        }
        Ok(body.chart.result.and_then(|r| r.into_iter().next()))
    }

    /// Full OHLCV history for the bulk CSV store.
    pub async fn fetch_daily_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<YahooBar>, MarketDataError> {
        let bars = self
            .fetch_chart(symbol, range)
            .await?
            .map(|chart| chart.to_bars())
            .unwrap_or_default();
        info!(
            "YahooMarketDataService: fetched {} daily bars for {} ({})",
            bars.len(),
            symbol,
            range
        );
        Ok(bars)
    }
}

#[async_trait]
impl MarketDataService for YahooMarketDataService {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<RawTable, MarketDataError> {
        let table = self
            .fetch_chart(symbol, range)
            .await?
            .map(|chart| chart.to_raw_table())
            .unwrap_or_default();
        debug!(
            "YahooMarketDataService: {} rows for {} ({})",
            table.rows.len(),
            symbol,
            range
        );
        Ok(table)
    }
}

#[derive(Default)]
pub struct YahooMarketDataServiceBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
}

impl YahooMarketDataServiceBuilder {
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn build(self) -> YahooMarketDataService {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));
        let client = HttpClientFactory::create_client(timeout, self.max_retries.unwrap_or(0));

        YahooMarketDataService { client, base_url }
    }
}
