//! Moving average calculation implementations
//!
//! Contains the averaging primitives used by the forecast pipeline:
//! - Trailing Simple Moving Average (SMA)
//! - Wilder's smoothed average (seed and recursive step)

use crate::{ensure_len, MathError, Result};

/// Simple mean of the last `period` values.
pub fn trailing_mean(values: &[f64], period: usize) -> Result<f64> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    ensure_len(values, period, "SMA calculation")?;

    let window = &values[values.len() - period..];
    Ok(window.iter().sum::<f64>() / period as f64)
}

/// Seed value of a Wilder average: the simple mean of the first `period` values.
pub fn wilder_seed(values: &[f64], period: usize) -> Result<f64> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    ensure_len(values, period, "Wilder seed")?;

    Ok(values[..period].iter().sum::<f64>() / period as f64)
}

/// One step of Wilder's recursion:
/// `avg_t = (avg_{t-1} * (period - 1) + value_t) / period`
#[inline]
pub fn wilder_step(previous: f64, value: f64, period: usize) -> f64 {
    let n = period as f64;
    (previous * (n - 1.0) + value) / n
}
