//! # Trade Math
//!
//! Mathematical building blocks for the metal forecast pipeline.
//! Everything here is a pure function over slices of `f64`: the crate has no
//! notion of dates, assets or regimes, which live in `metal_forecast`.

use thiserror::Error;

// Indicator modules
pub mod moving_averages;
pub mod oscillators;
pub mod statistics;
pub mod volatility;

/// Errors that can occur in trading-related calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;

pub(crate) fn ensure_len(values: &[f64], required: usize, what: &str) -> Result<()> {
    if values.len() < required {
        return Err(MathError::InsufficientData(format!(
            "Not enough data for {}. Need {} values, have {}.",
            what,
            required,
            values.len()
        )));
    }
    Ok(())
}
