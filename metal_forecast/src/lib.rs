//! # Metal Forecast
//!
//! A seven-day price outlook for precious and industrial metals.
//!
//! ## Features
//!
//! - RSI and ATR with Wilder smoothing
//! - Log-return beta and dual-window correlation against a secondary asset
//! - Currency-index (DXY) correlation
//! - BULL / BEAR / SIDEWAYS regime detection with a regime-change flag
//! - Clamped expected move with ratio mean-reversion pressure and an ATR range
//! - Six-factor confidence score with a copper-specific weight table
//! - Error-based grading of past forecasts and a walk-forward backtest
//!
//! ## Pipeline
//!
//! ```text
//! primary ──► indicators ─┐
//! secondary ─┬► metrics ──┼─► regime ─► prediction ─► confidence ─► PredictionResult
//! DXY ───────┘            │
//! market index ───────────┘
//! ```
//!
//! Every window, threshold and weight comes from [`ForecastConfig`]; the
//! defaults are the production constants.
//!
//! ## Quick Start
//!
//! ```no_run
//! use metal_forecast::{Asset, DataLoader, ForecastConfig, ForecastInputs, Forecaster, PriceUnit};
//!
//! # fn main() -> metal_forecast::Result<()> {
//! let gold = DataLoader::from_csv("gold.csv", PriceUnit::PerGram)?;
//! let silver = DataLoader::from_csv("silver.csv", PriceUnit::PerTroyOunce)?;
//! let dxy = DataLoader::from_csv("dxy.csv", PriceUnit::IndexPoints)?;
//! let spx = DataLoader::from_csv("spx.csv", PriceUnit::IndexPoints)?;
//!
//! let inputs = ForecastInputs::new(Asset::Gold, Asset::Silver, gold, silver, dxy)
//!     .with_market_index(spx);
//! let forecaster = Forecaster::new(ForecastConfig::default())?;
//! let result = forecaster.forecast(&inputs)?;
//!
//! println!(
//!     "{} {:.2} -> {:.2} [{:.2}, {:.2}] confidence {:.0}",
//!     result.primary, result.spot_price, result.predicted_price,
//!     result.low, result.high, result.confidence
//! );
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod confidence;
pub mod config;
pub mod cross_asset;
pub mod data;
pub mod error;
pub mod grading;
pub mod indicators;
pub mod pipeline;
pub mod prediction;
pub mod regime;

// Re-export commonly used types
pub use crate::backtest::{BacktestReport, Backtester};
pub use crate::confidence::{ConfidenceReport, Factor, FactorScore, WeightTableKind};
pub use crate::config::ForecastConfig;
pub use crate::cross_asset::CrossAssetMetrics;
pub use crate::data::{Asset, DataLoader, PriceBar, PriceSeries, PriceUnit};
pub use crate::error::{ForecastError, Result};
pub use crate::grading::{grade, AccuracySummary, Grade, GradeRecord, PredictionRecord};
pub use crate::indicators::{IndicatorSeries, IndicatorState};
pub use crate::pipeline::{ForecastInputs, Forecaster, PredictionResult};
pub use crate::prediction::{ClampTier, PredictionBreakdown};
pub use crate::regime::{Regime, RegimeInfo};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
