use crate::domain::market::{RawBar, RawClose, RawTable};
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;

// ===== v8 chart payload =====

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<Quote>,
}

/// Column-oriented OHLCV arrays aligned with `ChartResult::timestamp`.
/// Yahoo sends `null` for missing sessions.
#[derive(Debug, Default, Deserialize)]
pub struct Quote {
    pub open: Option<Vec<Option<f64>>>,
    pub high: Option<Vec<Option<f64>>>,
    pub low: Option<Vec<Option<f64>>>,
    pub close: Option<Vec<Option<f64>>>,
    pub volume: Option<Vec<Option<f64>>>,
}

/// One daily OHLCV row as stored in the historical CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct YahooBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

fn column_value(column: &Option<Vec<Option<f64>>>, idx: usize) -> Option<f64> {
    column.as_ref().and_then(|c| c.get(idx).copied().flatten())
}

impl ChartResult {
    fn quote(&self) -> Option<&Quote> {
        self.indicators.quote.first()
    }

    /// Timestamps paired with close cells; a missing close array is kept as a schema flag.
    pub fn to_raw_table(&self) -> RawTable {
        let closes = self.quote().and_then(|q| q.close.as_ref());
        let rows = self
            .timestamp
            .iter()
            .enumerate()
            .map(|(idx, &ts)| RawBar {
                timestamp: Some(ts),
                close: closes
                    .and_then(|c| c.get(idx).copied().flatten())
                    .map(RawClose::Number),
            })
            .collect();

        match closes {
            Some(_) => RawTable::new(rows),
            None => RawTable::without_close_column(rows),
        }
    }

    pub fn to_bars(&self) -> Vec<YahooBar> {
        let empty = Quote::default();
        let quote = self.quote().unwrap_or(&empty);
        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(idx, &ts)| {
                let date = DateTime::from_timestamp(ts, 0)?.date_naive();
                Some(YahooBar {
                    date,
                    open: column_value(&quote.open, idx),
                    high: column_value(&quote.high, idx),
                    low: column_value(&quote.low, idx),
                    close: column_value(&quote.close, idx),
                    volume: column_value(&quote.volume, idx),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "currency": "USD"},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, 184.22, null],
                        "high": [188.44, 185.88, null],
                        "low": [183.89, 183.43, null],
                        "close": [185.64, 184.25, null],
                        "volume": [82488700, 58414500, null]
                    }],
                    "adjclose": [{"adjclose": [184.94, 183.56, null]}]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_chart_payload() {
        let response: ChartResponse = serde_json::from_str(PAYLOAD).unwrap();
        let result = &response.chart.result.unwrap()[0];

        let table = result.to_raw_table();
        assert!(table.has_close_column);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0].close, Some(RawClose::Number(185.64)));
        assert_eq!(table.rows[2].close, None);

        let bars = result.to_bars();
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].volume, Some(58414500.0));
        assert_eq!(bars[2].close, None);
    }

    #[test]
    fn test_missing_close_array_is_flagged() {
        let payload = r#"{"chart":{"result":[{"timestamp":[1704205800],
            "indicators":{"quote":[{"open":[1.0]}]}}],"error":null}}"#;
        let response: ChartResponse = serde_json::from_str(payload).unwrap();
        let table = response.chart.result.unwrap()[0].to_raw_table();
        assert!(!table.has_close_column);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn test_not_found_error_payload() {
        let payload = r#"{"chart":{"result":null,"error":{"code":"Not Found",
            "description":"No data found, symbol may be delisted"}}}"#;
        let response: ChartResponse = serde_json::from_str(payload).unwrap();
        assert!(response.chart.result.is_none());
        assert_eq!(response.chart.error.unwrap().code, "Not Found");
    }
}
