//! Oscillator indicator implementations
//!
//! Contains the pieces of the Relative Strength Index (RSI) and the
//! close-to-close momentum measures:
//! - per-bar gain/loss split
//! - RSI from smoothed averages
//! - percentage momentum over a lookback

use crate::{ensure_len, MathError, Result};

/// Split consecutive close-to-close changes into gains and losses.
///
/// Both returned vectors have `closes.len() - 1` elements and are non-negative.
pub fn gains_and_losses(closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
    closes
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip()
}

/// RSI (0-100) from Wilder-smoothed average gain and average loss.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // No losses to divide by
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    let rsi = 100.0 - (100.0 / (1.0 + rs));
    rsi.clamp(0.0, 100.0)
}

/// Fractional change of the last close against the close `period` bars earlier.
pub fn momentum(closes: &[f64], period: usize) -> Result<f64> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    ensure_len(closes, period + 1, "momentum calculation")?;

    let current = closes[closes.len() - 1];
    let past = closes[closes.len() - 1 - period];
    if past <= 0.0 || current <= 0.0 {
        return Err(MathError::InvalidInput(
            "Momentum requires positive prices".to_string(),
        ));
    }

    Ok(current / past - 1.0)
}
