//! Synthetic series shared by the integration tests.
#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use metal_forecast::{Asset, ForecastInputs, PriceBar, PriceSeries, PriceUnit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

pub fn dates(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| start_date() + Duration::days(i as i64))
        .collect()
}

/// Close-only bars on consecutive days.
pub fn flat_series(closes: &[f64], unit: PriceUnit) -> PriceSeries {
    PriceSeries::from_closes(unit, &dates(closes.len()), closes).unwrap()
}

/// Bars with a symmetric intraday range of `spread` around each close.
pub fn ohlc_series(closes: &[f64], spread: f64) -> PriceSeries {
    let bars = dates(closes.len())
        .into_iter()
        .zip(closes)
        .map(|(d, &c)| PriceBar::new(d, c, c * (1.0 + spread), c * (1.0 - spread), c))
        .collect();
    PriceSeries::new(PriceUnit::PerGram, bars).unwrap()
}

/// `start * (1 + rate)^i`
pub fn compounding(start: f64, rate: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start * (1.0 + rate).powi(i as i32)).collect()
}

/// Geometric random walk with uniform daily log returns in `[-vol, vol]`.
pub fn random_walk(start: f64, vol: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = start;
    (0..n)
        .map(|i| {
            if i > 0 {
                price *= rng.gen_range(-vol..=vol).exp();
            }
            price
        })
        .collect()
}

/// Log returns of a series, for building series with known relationships.
pub fn returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Rebuild prices from a start value and log returns.
pub fn from_returns(start: f64, rets: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(rets.len() + 1);
    out.push(start);
    let mut p = start;
    for r in rets {
        p *= r.exp();
        out.push(p);
    }
    out
}

/// Gold vs silver on `n` shared days with random walks from `seed`.
pub fn gold_silver_inputs(n: usize, seed: u64) -> ForecastInputs {
    let gold = random_walk(75.0, 0.01, n, seed);
    let silver = random_walk(28.0, 0.015, n, seed + 1);
    let dxy = random_walk(104.0, 0.004, n, seed + 2);
    let spx = random_walk(5000.0, 0.01, n, seed + 3);
    ForecastInputs::new(
        Asset::Gold,
        Asset::Silver,
        ohlc_series(&gold, 0.004),
        flat_series(&silver, PriceUnit::PerTroyOunce),
        flat_series(&dxy, PriceUnit::IndexPoints),
    )
    .with_market_index(flat_series(&spx, PriceUnit::IndexPoints))
}
