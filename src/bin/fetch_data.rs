//! Downloads daily OHLCV history for one symbol into the historical CSV store.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use pricecast::config::{DEFAULT_HISTORICAL_DATA_PATH, MarketDataEnvConfig};
use pricecast::domain::market::HistoryRange;
use pricecast::infrastructure::persistence::historical_csv;
use pricecast::infrastructure::yahoo::YahooMarketDataService;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker to download
    #[arg(long, default_value = "AAPL")]
    symbol: String,

    /// First session to include (YYYY-MM-DD)
    #[arg(long, default_value = "2015-01-01")]
    start: NaiveDate,

    /// Output CSV path
    #[arg(long, default_value = DEFAULT_HISTORICAL_DATA_PATH)]
    output: PathBuf,

    /// Request timeout; bulk history is much larger than a serving fetch
    #[arg(long, default_value_t = 30_000)]
    timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let market_config = MarketDataEnvConfig::from_env()?;

    let service = YahooMarketDataService::builder()
        .base_url(market_config.base_url)
        .timeout(Duration::from_millis(args.timeout_ms))
        .max_retries(market_config.max_retries)
        .build();

    let symbol = args.symbol.to_uppercase();
    info!("Downloading {} daily history since {}...", symbol, args.start);
    let bars = service
        .fetch_daily_history(&symbol, HistoryRange::Since(args.start))
        .await?;
    if bars.is_empty() {
        bail!("No data returned for {}", symbol);
    }

    historical_csv::save_bars(&args.output, &bars)?;
    println!(
        "Saved {} sessions for {} ({} .. {}) to {:?}",
        bars.len(),
        symbol,
        bars[0].date,
        bars[bars.len() - 1].date,
        args.output
    );
    Ok(())
}
