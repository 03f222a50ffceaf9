//! Error types for the metal_forecast crate

use thiserror::Error;
use trade_math::MathError;

/// Custom error types for the metal_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A stage was handed fewer bars than its window needs
    #[error("Insufficient data for {window}: need {required} bars, have {available} (short by {})", required.saturating_sub(*available))]
    InsufficientData {
        window: String,
        required: usize,
        available: usize,
    },

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration that breaks its own invariants
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from the numeric primitives
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from TOML parsing
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForecastError {
    pub(crate) fn insufficient(window: impl Into<String>, required: usize, available: usize) -> Self {
        ForecastError::InsufficientData {
            window: window.into(),
            required,
            available,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
