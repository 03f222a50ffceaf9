//! # Metal Outlook
//!
//! Workspace facade over the forecasting crates.
//!
//! - [`trade_math`]: numeric primitives (Wilder averages, RSI, true range,
//!   log-return moments)
//! - [`metal_forecast`]: the forecast pipeline, grading and backtest
//!
//! ```
//! use metal_outlook_workspace::metal_forecast::ForecastConfig;
//!
//! let config = ForecastConfig::default();
//! assert_eq!(config.windows.horizon_days, 7);
//! ```

pub use metal_forecast;
pub use trade_math;
