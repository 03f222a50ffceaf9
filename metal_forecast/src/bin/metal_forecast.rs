//! Command line front end for the metal forecast pipeline.
//!
//! ```bash
//! # Forecast gold against silver with S&P 500 as the regime index
//! metal-forecast forecast --primary gold --secondary silver \
//!     --primary-csv gold.csv --secondary-csv silver.csv --dxy-csv dxy.csv \
//!     --index-csv spx.csv
//!
//! # Walk-forward backtest, rows written as CSV
//! metal-forecast backtest ... --output rows.csv
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use metal_forecast::{
    Asset, Backtester, DataLoader, ForecastConfig, ForecastInputs, Forecaster, PredictionResult,
    PriceUnit,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "metal-forecast",
    version,
    about = "Seven-day metal price outlook with range, regime and confidence"
)]
struct Cli {
    /// TOML file overriding any window, threshold or weight.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Forecast the primary metal from the latest bars.
    Forecast(SeriesArgs),
    /// Walk forward through history, grading every forecast.
    Backtest(BacktestArgs),
}

#[derive(Debug, Args)]
struct SeriesArgs {
    /// Metal to forecast (gold, silver, platinum, copper).
    #[arg(long)]
    primary: Asset,

    /// Correlated asset (a metal or sp500).
    #[arg(long)]
    secondary: Asset,

    /// `date,open,high,low,close` CSV of the primary, priced per gram.
    #[arg(long)]
    primary_csv: PathBuf,

    #[arg(long)]
    secondary_csv: PathBuf,

    /// Currency-strength index CSV.
    #[arg(long)]
    dxy_csv: PathBuf,

    /// Broad-market index CSV for the regime; defaults to the secondary.
    #[arg(long)]
    index_csv: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct BacktestArgs {
    #[command(flatten)]
    series: SeriesArgs,

    /// Forecast every n-th eligible date.
    #[arg(long, default_value_t = 1)]
    step: usize,

    #[arg(long)]
    start: Option<NaiveDate>,

    #[arg(long)]
    end: Option<NaiveDate>,

    /// Write the graded rows to this CSV file.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&cli.log_level))
                .context("invalid log filter")?,
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ForecastConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ForecastConfig::default(),
    };
    let forecaster = Forecaster::new(config)?;

    match &cli.command {
        Command::Forecast(args) => {
            let inputs = load_inputs(args)?;
            let result = forecaster.forecast(&inputs)?;
            if cli.json {
                println!("{}", result.to_json_pretty()?);
            } else {
                print_forecast(&result);
            }
        }
        Command::Backtest(args) => {
            let inputs = load_inputs(&args.series)?;
            let report = Backtester::new(forecaster)
                .with_step(args.step)?
                .with_range(args.start, args.end)
                .run(&inputs)?;

            if let Some(path) = &args.output {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                report.write_csv(file)?;
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report.summary)?);
            } else {
                match &report.summary {
                    Some(summary) => println!("{}", summary),
                    None => println!("No date had enough history to forecast"),
                }
                println!("Skipped dates:      {}", report.skipped);
            }
        }
    }

    Ok(())
}

fn load(path: &Path, unit: PriceUnit) -> Result<metal_forecast::PriceSeries> {
    DataLoader::from_csv(path, unit).with_context(|| format!("failed to load {}", path.display()))
}

fn load_inputs(args: &SeriesArgs) -> Result<ForecastInputs> {
    let secondary_unit = if args.secondary.is_metal() {
        PriceUnit::PerTroyOunce
    } else {
        PriceUnit::IndexPoints
    };
    let mut inputs = ForecastInputs::new(
        args.primary,
        args.secondary,
        load(&args.primary_csv, PriceUnit::PerGram)?,
        load(&args.secondary_csv, secondary_unit)?,
        load(&args.dxy_csv, PriceUnit::IndexPoints)?,
    );
    if let Some(path) = &args.index_csv {
        inputs = inputs.with_market_index(load(path, PriceUnit::IndexPoints)?);
    }
    Ok(inputs)
}

fn print_forecast(result: &PredictionResult) {
    let b = &result.breakdown;
    println!(
        "{} vs {} as of {} ({}-day horizon)",
        result.primary, result.secondary, result.as_of, result.horizon_days
    );
    println!("  Spot:        {:.4}", result.spot_price);
    println!(
        "  Forecast:    {:.4} ({:+.2}%)",
        result.predicted_price, result.change_pct
    );
    println!("  Range:       {:.4} .. {:.4}", result.low, result.high);
    println!(
        "  Regime:      {}{}",
        result.regime,
        if result.regime_change { " (regime change)" } else { "" }
    );
    println!("  Confidence:  {:.1}", result.confidence);
    println!();
    println!("  Secondary momentum {:+.4}", b.secondary_momentum);
    println!(
        "  Beta raw {:?} clamped {:?} effective {:.4}{}",
        b.beta_raw,
        b.beta_clamped,
        b.beta_effective,
        if b.beta_fallback { " (fallback)" } else { "" }
    );
    println!(
        "  Raw move {:+.4} -> {:+.4} ({} tier, +/-{:.2})",
        b.raw_move, result.expected_move, b.clamp_tier, b.clamp_bound
    );
    println!(
        "  Ratio {:.6} vs avg {:.6} (deviation {:+.4}), multiplier {:.4}, pressure {:+.4}{}",
        b.ratio_current,
        b.ratio_average,
        b.ratio_deviation,
        b.pressure_multiplier,
        result.ratio_pressure,
        if b.bearish_filter { " (bearish filter)" } else { "" }
    );
    println!(
        "  RSI {:.2}  ATR {:.4}  volatility {:.2}%",
        b.rsi, b.atr, b.volatility_pct
    );
    for f in &result.confidence_report.factors {
        println!("  {:<16} {:>5.1} / {:<4.0} {}", f.factor.to_string(), f.score, f.max, f.rationale);
    }
    for note in &result.notes {
        println!("  note: {}", note);
    }
}
