//! Trains the two-layer LSTM next-close predictor on the historical CSV store.

use anyhow::{Context, Result};
use clap::Parser;
use pricecast::application::ml::evaluation::evaluate_predictor;
use pricecast::application::ml::sequence::AdamConfig;
use pricecast::application::ml::{SequencePredictor, SequenceTrainingConfig, TrainingCorpus};
use pricecast::config::{
    DEFAULT_HISTORICAL_DATA_PATH, DEFAULT_SCALER_PATH, DEFAULT_SEQUENCE_MODEL_PATH,
};
use pricecast::domain::market::PriceSeries;
use pricecast::domain::ml::{TRAIN_FRACTION, WINDOW_SIZE};
use pricecast::infrastructure::persistence::{historical_csv, save_json};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the historical daily CSV
    #[arg(long, default_value = DEFAULT_HISTORICAL_DATA_PATH)]
    input: PathBuf,

    /// Path to output model file
    #[arg(long, default_value = DEFAULT_SEQUENCE_MODEL_PATH)]
    output: PathBuf,

    /// Path to output scaling range
    #[arg(long, default_value = DEFAULT_SCALER_PATH)]
    scaler_output: PathBuf,

    /// Symbol the CSV holds (used in logs only)
    #[arg(long, default_value = "AAPL")]
    symbol: String,

    /// Disable train/test split (train on 100% of windows).
    #[arg(long)]
    no_split: bool,

    #[arg(long, default_value_t = 5)]
    epochs: usize,

    #[arg(long, default_value_t = 32)]
    batch_size: usize,

    /// Units per LSTM layer
    #[arg(long, default_value_t = 50)]
    hidden_size: usize,

    #[arg(long, default_value_t = 1e-3)]
    learning_rate: f64,

    /// Seed for weight initialisation and shuffling (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();

    let table = historical_csv::load_raw_table(&args.input)?;
    let series = PriceSeries::from_raw(&args.symbol, &table).context("Invalid price history")?;
    let corpus = TrainingCorpus::prepare(series, WINDOW_SIZE)?;
    let train = corpus.training_set(TRAIN_FRACTION, args.no_split);

    let config = SequenceTrainingConfig {
        hidden_size: args.hidden_size,
        epochs: args.epochs,
        batch_size: args.batch_size,
        adam: AdamConfig {
            learning_rate: args.learning_rate,
            ..AdamConfig::default()
        },
        seed: args.seed,
        ..SequenceTrainingConfig::default()
    };
    println!(
        "Training LSTM({}) x {} on {} of {} windows for {} epochs...",
        config.hidden_size,
        config.num_layers,
        train.len(),
        corpus.dataset().len(),
        config.epochs
    );

    let (model, history) = SequencePredictor::train(&train, &config)?;
    for (epoch, loss) in history.epoch_losses.iter().enumerate() {
        println!("Epoch {}/{} - loss: {:.6}", epoch + 1, config.epochs, loss);
    }

    if !args.no_split {
        let (_, test) = corpus.split(TRAIN_FRACTION);
        if !test.is_empty() {
            let held_out = evaluate_predictor(&model, &test, &corpus.range())?;
            println!(
                "Test    MAE: {:.4}  RMSE: {:.4}  R2: {:.4}",
                held_out.mae, held_out.rmse, held_out.r2
            );
        }
    }

    save_json(&args.output, &model)?;
    save_json(&args.scaler_output, &corpus.range())?;
    println!(
        "Model saved to {:?}, scaler saved to {:?}.",
        args.output, args.scaler_output
    );
    Ok(())
}
