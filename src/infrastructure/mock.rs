use crate::domain::errors::MarketDataError;
use crate::domain::market::{HistoryRange, RawBar, RawTable};
use crate::domain::ports::MarketDataService;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const SECONDS_PER_DAY: i64 = 86_400;
// 2024-01-02 00:00 UTC
const FIRST_SESSION: i64 = 1_704_153_600;

/// In-memory market data with fixed tables per symbol.
///
/// Unknown symbols return an empty table, like the live provider does.
#[derive(Clone, Default)]
pub struct MockMarketDataService {
    tables: HashMap<String, RawTable>,
    delay: Option<Duration>,
    failure: Option<String>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers daily closes for `symbol`, one session per day.
    pub fn with_closes(self, symbol: &str, closes: &[f64]) -> Self {
        let rows = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| RawBar::new(FIRST_SESSION + SECONDS_PER_DAY * i as i64, close))
            .collect();
        self.with_table(symbol, RawTable::new(rows))
    }

    pub fn with_table(mut self, symbol: &str, table: RawTable) -> Self {
        self.tables.insert(symbol.to_uppercase(), table);
        self
    }

    /// Sleeps before answering, to exercise fetch timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fails every request with a transport error.
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_string());
        self
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<RawTable, MarketDataError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(MarketDataError::RequestFailed {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }

        let table = self
            .tables
            .get(&symbol.to_uppercase())
            .cloned()
            .unwrap_or_default();
        debug!(
            "MockMarketDataService: {} rows for {} ({})",
            table.rows.len(),
            symbol,
            range
        );
        Ok(table)
    }
}
