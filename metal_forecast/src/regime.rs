//! Market regime classification
//!
//! A stateless function of the broad-market index, the primary RSI and the
//! fast/slow correlations; it is recomputed on every request.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use trade_math::moving_averages::trailing_mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Regime {
    Bull,
    Bear,
    Sideways,
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Regime::Bull => "BULL",
            Regime::Bear => "BEAR",
            Regime::Sideways => "SIDEWAYS",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeInfo {
    pub regime: Regime,
    /// Correlation structure shifted faster than the slow window reflects.
    pub regime_change: bool,
    pub index_value: f64,
    pub index_ma: f64,
    pub correlation_divergence: f64,
}

/// Classify the market.
///
/// - index above its moving average: BULL, otherwise BEAR
/// - primary RSI inside the sideways band overrides both with SIDEWAYS
/// - `|rho_fast - rho_slow|` above the divergence threshold sets `regime_change`
pub fn detect_regime(
    index_closes: &[f64],
    primary_rsi: f64,
    rho_fast: f64,
    rho_slow: f64,
    config: &ForecastConfig,
) -> Result<RegimeInfo> {
    let window = config.windows.regime_ma;
    if index_closes.len() < config.min_regime_bars() {
        return Err(ForecastError::insufficient(
            format!("{}-day market index moving average", window),
            config.min_regime_bars(),
            index_closes.len(),
        ));
    }

    let index_value = index_closes[index_closes.len() - 1];
    let index_ma = trailing_mean(index_closes, window)?;

    let r = &config.regime;
    let regime = if (r.sideways_rsi_low..=r.sideways_rsi_high).contains(&primary_rsi) {
        Regime::Sideways
    } else if index_value > index_ma {
        Regime::Bull
    } else {
        Regime::Bear
    };

    let correlation_divergence = (rho_fast - rho_slow).abs();
    let regime_change = correlation_divergence > r.correlation_divergence;
    if regime_change {
        tracing::warn!(
            rho_fast,
            rho_slow,
            correlation_divergence,
            "Regime change: fast and slow correlations diverge"
        );
    }
    tracing::debug!(%regime, index_value, index_ma, "Regime detected");

    Ok(RegimeInfo {
        regime,
        regime_change,
        index_value,
        index_ma,
        correlation_divergence,
    })
}
