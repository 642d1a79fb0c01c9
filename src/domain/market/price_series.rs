use crate::domain::errors::PipelineError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A close value as delivered by a provider or a CSV cell, before coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawClose {
    Number(f64),
    Text(String),
}

impl RawClose {
    /// Coerces the value to a finite price. Non-numeric text, NaN and infinities yield `None`.
    pub fn to_price(&self) -> Option<f64> {
        let value = match self {
            RawClose::Number(v) => *v,
            RawClose::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// One untyped row from the market data provider or the historical store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    /// Unix seconds, `None` when the row's date could not be parsed.
    pub timestamp: Option<i64>,
    pub close: Option<RawClose>,
}

impl RawBar {
    pub fn new(timestamp: i64, close: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            close: Some(RawClose::Number(close)),
        }
    }
}

/// Rows as returned by a provider, with the schema uncertainty still attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub has_close_column: bool,
    pub rows: Vec<RawBar>,
}

impl RawTable {
    pub fn new(rows: Vec<RawBar>) -> Self {
        Self {
            has_close_column: true,
            rows,
        }
    }

    pub fn without_close_column(rows: Vec<RawBar>) -> Self {
        Self {
            has_close_column: false,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: i64,
    pub close: f64,
}

/// Chronologically ordered closing prices with no missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Coerce and validate a raw table into a typed series.
    ///
    /// Rows whose close is not numeric or whose timestamp is missing are dropped.
    /// Rows that do not advance the clock are dropped with a warning.
    pub fn from_raw(symbol: &str, table: &RawTable) -> Result<Self, PipelineError> {
        if table.is_empty() {
            return Err(PipelineError::NoData);
        }
        if !table.has_close_column {
            return Err(PipelineError::MissingClose);
        }

        let mut points: Vec<PricePoint> = Vec::with_capacity(table.rows.len());
        let mut dropped = 0usize;

        for row in &table.rows {
            let (Some(timestamp), Some(close)) = (
                row.timestamp,
                row.close.as_ref().and_then(RawClose::to_price),
            ) else {
                dropped += 1;
                continue;
            };

            if let Some(last) = points.last() {
                if timestamp <= last.timestamp {
                    warn!(
                        "PriceSeries: {} dropping out-of-order row at {} (last {})",
                        symbol, timestamp, last.timestamp
                    );
                    dropped += 1;
                    continue;
                }
            }

            points.push(PricePoint { timestamp, close });
        }

        if dropped > 0 {
            debug!(
                "PriceSeries: {} kept {} rows, dropped {} invalid rows",
                symbol,
                points.len(),
                dropped
            );
        }

        Ok(Self {
            symbol: symbol.to_string(),
            points,
        })
    }

    pub fn from_points(symbol: &str, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.to_string(),
            points,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
