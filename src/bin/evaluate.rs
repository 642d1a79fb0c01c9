//! Compares both trained predictors on the held-out 20% of the historical CSV.

use anyhow::{Context, Result};
use clap::Parser;
use pricecast::application::ml::{
    EvaluationReport, LinearPredictor, SequencePredictor, TrainingCorpus,
};
use pricecast::config::{
    DEFAULT_HISTORICAL_DATA_PATH, DEFAULT_LINEAR_MODEL_PATH, DEFAULT_SCALER_PATH,
    DEFAULT_SEQUENCE_MODEL_PATH,
};
use pricecast::domain::market::PriceSeries;
use pricecast::domain::ml::{ScalingRange, TRAIN_FRACTION, WINDOW_SIZE};
use pricecast::infrastructure::persistence::{historical_csv, load_json};
use std::path::PathBuf;
use tracing::{Level, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the historical daily CSV
    #[arg(long, default_value = DEFAULT_HISTORICAL_DATA_PATH)]
    input: PathBuf,

    #[arg(long, default_value = DEFAULT_LINEAR_MODEL_PATH)]
    linear_model: PathBuf,

    #[arg(long, default_value = DEFAULT_SEQUENCE_MODEL_PATH)]
    sequence_model: PathBuf,

    /// Scaling range persisted by training
    #[arg(long, default_value = DEFAULT_SCALER_PATH)]
    scaler: PathBuf,

    #[arg(long, default_value = "AAPL")]
    symbol: String,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    let linear: LinearPredictor = load_json(&args.linear_model)?;
    let sequence: SequencePredictor = load_json(&args.sequence_model)?;

    let table = historical_csv::load_raw_table(&args.input)?;
    let series = PriceSeries::from_raw(&args.symbol, &table).context("Invalid price history")?;
    let corpus = match load_json::<ScalingRange>(&args.scaler) {
        Ok(range) => TrainingCorpus::with_range(series, range, WINDOW_SIZE)?,
        Err(e) => {
            warn!(
                "Could not load training scaler ({:#}); refitting on the full corpus",
                e
            );
            TrainingCorpus::prepare(series, WINDOW_SIZE)?
        }
    };

    let (_, test) = corpus.split(TRAIN_FRACTION);
    let report = EvaluationReport::evaluate(&linear, &sequence, &test, &corpus.range())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
