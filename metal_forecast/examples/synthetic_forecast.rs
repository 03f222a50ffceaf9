//! Forecast and backtest on synthetic random-walk data.
//!
//! Run with `RUST_LOG=metal_forecast=debug` to see each pipeline stage.

use chrono::{Duration, NaiveDate};
use metal_forecast::{
    Asset, Backtester, ForecastInputs, Forecaster, PriceBar, PriceSeries, PriceUnit,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn walk(start: f64, vol: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start;
    (0..n)
        .map(|_| {
            price *= rng.gen_range(-vol..=vol).exp();
            price
        })
        .collect()
}

fn series(closes: &[f64], unit: PriceUnit, spread: f64) -> metal_forecast::Result<PriceSeries> {
    let start = NaiveDate::from_ymd_opt(2023, 1, 2).expect("valid date");
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            PriceBar::new(
                start + Duration::days(i as i64),
                c,
                c * (1.0 + spread),
                c * (1.0 - spread),
                c,
            )
        })
        .collect();
    PriceSeries::new(unit, bars)
}

fn main() -> metal_forecast::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let n = 250;
    let inputs = ForecastInputs::new(
        Asset::Platinum,
        Asset::Gold,
        series(&walk(31.0, 0.012, n, 1), PriceUnit::PerGram, 0.006)?,
        series(&walk(2050.0, 0.009, n, 2), PriceUnit::PerTroyOunce, 0.0)?,
        series(&walk(103.0, 0.004, n, 3), PriceUnit::IndexPoints, 0.0)?,
    )
    .with_market_index(series(&walk(4700.0, 0.01, n, 4), PriceUnit::IndexPoints, 0.0)?);

    let forecaster = Forecaster::default();
    let result = forecaster.forecast(&inputs)?;
    println!("{}", result.to_json_pretty()?);

    let report = Backtester::new(forecaster).with_step(5)?.run(&inputs)?;
    if let Some(summary) = report.summary {
        println!("{}", summary);
    }
    Ok(())
}
