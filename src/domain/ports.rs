use crate::domain::errors::{MarketDataError, PredictorError};
use crate::domain::market::{HistoryRange, RawTable};
use async_trait::async_trait;

/// Source of daily bars for a symbol.
///
/// Implementations may return an empty table for unknown symbols; schema
/// problems are reported through [`RawTable::has_close_column`].
#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn fetch_daily_bars(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<RawTable, MarketDataError>;
}

/// A trained model mapping a normalized window to the normalized next close.
///
/// Implementations hold no mutable state, so one instance can serve
/// concurrent requests.
pub trait NextValuePredictor: Send + Sync {
    fn predict(&self, window: &[f64]) -> Result<f64, PredictorError>;

    /// Number of values expected in each window.
    fn window_size(&self) -> usize;

    fn name(&self) -> &str;
}
