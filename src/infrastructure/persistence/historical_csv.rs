use crate::domain::market::{RawBar, RawClose, RawTable};
use crate::infrastructure::yahoo::YahooBar;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Reads a daily history CSV: dates in the first column, a `Close` column somewhere.
///
/// Extra header rows written by some exporters (`Ticker,AAPL,...`, `Date,,,`)
/// come out as rows without a timestamp and are dropped by series validation.
pub fn read_raw_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let close_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("close"));

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.context("Malformed CSV record")?;
        let timestamp = record.get(0).and_then(parse_date_cell);
        let close = close_idx
            .and_then(|idx| record.get(idx))
            .filter(|cell| !cell.is_empty())
            .map(|cell| RawClose::Text(cell.to_string()));
        rows.push(RawBar { timestamp, close });
    }

    debug!(
        "historical_csv: {} rows, close column {:?}",
        rows.len(),
        close_idx
    );
    Ok(match close_idx {
        Some(_) => RawTable::new(rows),
        None => RawTable::without_close_column(rows),
    })
}

pub fn load_raw_table(path: &Path) -> Result<RawTable> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open historical data {}", path.display()))?;
    let table = read_raw_table(BufReader::new(file))
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(
        "Loaded {} rows from {}",
        table.rows.len(),
        path.display()
    );
    Ok(table)
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date_cell(cell: &str) -> Option<i64> {
    let date = cell.get(..10)?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp())
}

#[derive(Serialize)]
struct HistoryRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: Option<f64>,
    #[serde(rename = "Volume")]
    volume: Option<f64>,
}

pub fn write_bars<W: Write>(writer: W, bars: &[YahooBar]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for bar in bars {
        wtr.serialize(HistoryRecord {
            date: bar.date.format("%Y-%m-%d").to_string(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_bars(path: &Path, bars: &[YahooBar]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_bars(file, bars)?;
    info!("Saved {} daily bars to {}", bars.len(), path.display());
    Ok(())
}
