//! Volatility indicator implementations
//!
//! Contains the building blocks of the Average True Range (ATR):
//! - True Range of a bar against the previous close
//! - ATR expressed as a percentage of price

use crate::{MathError, Result};

/// True Range is the greatest of:
/// 1. High - Low
/// 2. |High - Previous Close|
/// 3. |Low - Previous Close|
#[inline]
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    let high_low = high - low;
    let high_pc = (high - prev_close).abs();
    let low_pc = (low - prev_close).abs();

    high_low.max(high_pc).max(low_pc)
}

/// True ranges for every bar after the first.
pub fn true_ranges(highs: &[f64], lows: &[f64], closes: &[f64]) -> Result<Vec<f64>> {
    if highs.len() != closes.len() || lows.len() != closes.len() {
        return Err(MathError::InvalidInput(format!(
            "High/low/close lengths differ ({}, {}, {})",
            highs.len(),
            lows.len(),
            closes.len()
        )));
    }

    Ok((1..closes.len())
        .map(|i| true_range(highs[i], lows[i], closes[i - 1]))
        .collect())
}

/// ATR as a percentage of `price`.
pub fn volatility_percent(atr: f64, price: f64) -> Result<f64> {
    if price <= 0.0 {
        return Err(MathError::InvalidInput(
            "Price must be greater than zero".to_string(),
        ));
    }
    Ok(atr / price * 100.0)
}
