//! Prediction engine
//!
//! Turns indicator, cross-asset and regime outputs into an expected move, a
//! ratio mean-reversion pressure, a point forecast and an ATR range. The steps
//! run in a fixed order and every intermediate lands in [`PredictionBreakdown`].

use crate::config::{ClampTiers, ForecastConfig};
use crate::cross_asset::CrossAssetMetrics;
use crate::data::AlignedCloses;
use crate::error::{ForecastError, Result};
use crate::indicators::IndicatorSeries;
use crate::regime::{Regime, RegimeInfo};
use serde::{Deserialize, Serialize};
use std::fmt;
use trade_math::moving_averages::trailing_mean;
use trade_math::oscillators::momentum;

/// Bound applied to the expected move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClampTier {
    Normal,
    Elevated,
    Crisis,
}

impl ClampTier {
    /// Pick the tier; crisis conditions are checked first.
    pub fn select(volatility_pct: f64, regime_change: bool, config: &ForecastConfig) -> Self {
        let p = &config.prediction;
        if volatility_pct >= p.volatility_crisis_pct || regime_change {
            ClampTier::Crisis
        } else if volatility_pct >= p.volatility_elevated_pct {
            ClampTier::Elevated
        } else {
            ClampTier::Normal
        }
    }

    /// Symmetric bound as a fraction of spot.
    pub fn bound(self, tiers: &ClampTiers) -> f64 {
        match self {
            ClampTier::Normal => tiers.normal,
            ClampTier::Elevated => tiers.elevated,
            ClampTier::Crisis => tiers.crisis,
        }
    }
}

impl fmt::Display for ClampTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ClampTier::Normal => "normal",
            ClampTier::Elevated => "elevated",
            ClampTier::Crisis => "crisis",
        })
    }
}

/// Every intermediate value of one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionBreakdown {
    pub spot_price: f64,
    pub rsi: f64,
    pub atr: f64,
    pub volatility_pct: f64,

    pub secondary_avg_short: f64,
    pub secondary_avg_long: f64,
    pub secondary_momentum: f64,

    pub beta_raw: Option<f64>,
    pub beta_clamped: Option<f64>,
    /// True when beta was undefined and the neutral fallback was used.
    pub beta_fallback: bool,
    pub beta_effective: f64,
    pub raw_move: f64,
    pub clamp_tier: ClampTier,
    pub clamp_bound: f64,

    pub correlation_fast: Option<f64>,
    pub correlation_slow: Option<f64>,
    pub dxy_correlation: Option<f64>,

    pub ratio_current: f64,
    pub ratio_average: f64,
    pub ratio_deviation: f64,
    pub pressure_multiplier: f64,
    pub primary_momentum_short: f64,
    pub primary_momentum_long: f64,
    /// Primary momentum was negative, so ratio pressure was forced to zero.
    pub bearish_filter: bool,

    /// `atr * sqrt(horizon)`
    pub range_half_width: f64,
}

/// Point forecast with its range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceProjection {
    pub predicted_price: f64,
    pub expected_move: f64,
    pub ratio_pressure: f64,
    pub low: f64,
    pub high: f64,
    pub breakdown: PredictionBreakdown,
}

/// Closes the engine reads beyond the precomputed stage outputs.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub primary_closes: &'a [f64],
    pub secondary_closes: &'a [f64],
    /// Primary (left) and secondary (right) on shared dates.
    pub pair: &'a AlignedCloses,
}

/// `exp(ln(avg_short / avg_long)) - 1` over the trailing closes.
///
/// Returns `(avg_short, avg_long, momentum)`.
pub fn secondary_momentum(closes: &[f64], short: usize, long: usize) -> Result<(f64, f64, f64)> {
    let need = short.max(long);
    if closes.len() < need {
        return Err(ForecastError::insufficient(
            format!("{}-day secondary momentum", need),
            need,
            closes.len(),
        ));
    }
    let avg_short = trailing_mean(closes, short)?;
    let avg_long = trailing_mean(closes, long)?;
    let m = (avg_short / avg_long).ln().exp() - 1.0;
    Ok((avg_short, avg_long, m))
}

/// Current secondary/primary ratio, its trailing mean and the relative deviation.
pub fn ratio_deviation(pair: &AlignedCloses, window: usize) -> Result<(f64, f64, f64)> {
    if pair.len() < window + 1 {
        return Err(ForecastError::insufficient(
            format!("{}-day price ratio average", window),
            window + 1,
            pair.len(),
        ));
    }
    let ratios: Vec<f64> = pair
        .left()
        .iter()
        .zip(pair.right())
        .map(|(p, s)| s / p)
        .collect();
    let current = ratios[ratios.len() - 1];
    let average = trailing_mean(&ratios, window)?;
    Ok((current, average, (current - average) / average))
}

/// Run the prediction steps for a spot price `spot`.
pub fn predict(
    spot: f64,
    metrics: &CrossAssetMetrics,
    indicators: &IndicatorSeries,
    regime: &RegimeInfo,
    market: MarketContext<'_>,
    config: &ForecastConfig,
) -> Result<PriceProjection> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(ForecastError::ValidationError(format!(
            "Spot price must be positive, got {}",
            spot
        )));
    }
    let w = &config.windows;
    let p = &config.prediction;

    let (secondary_avg_short, secondary_avg_long, secondary_momentum) =
        secondary_momentum(market.secondary_closes, w.momentum_short, w.momentum_long)?;

    let beta_fallback = metrics.beta.clamped.is_none();
    let beta = metrics.beta.clamped.unwrap_or(p.fallback_beta);
    let is_bear = regime.regime == Regime::Bear;
    let beta_effective = if is_bear || regime.regime_change {
        beta * p.beta_shrink
    } else {
        beta
    };

    let mut raw_move = secondary_momentum * beta_effective;
    if is_bear {
        raw_move *= p.bear_safety_factor;
    }

    let clamp_tier = ClampTier::select(indicators.volatility_pct, regime.regime_change, config);
    let clamp_bound = clamp_tier.bound(&p.clamp);
    let expected_move = raw_move.clamp(-clamp_bound, clamp_bound);

    let (ratio_current, ratio_average, deviation) = ratio_deviation(market.pair, w.ratio_average)?;

    let rho_slow = metrics.rho_slow();
    let mut pressure_multiplier = if rho_slow < 0.0 {
        0.0
    } else {
        rho_slow.abs() * p.pressure_factor
    };
    if regime.regime == Regime::Sideways {
        pressure_multiplier *= p.sideways_pressure_boost;
    }

    let primary_momentum_short = momentum(market.primary_closes, w.momentum_short)?;
    let primary_momentum_long = momentum(market.primary_closes, w.primary_momentum)?;
    let bearish_filter = primary_momentum_long < 0.0;
    let ratio_pressure = if bearish_filter {
        0.0
    } else {
        deviation * pressure_multiplier
    };

    let predicted_price = spot * (1.0 + expected_move + ratio_pressure);
    let range_half_width = indicators.final_atr * (w.horizon_days as f64).sqrt();

    tracing::debug!(
        secondary_momentum,
        beta_effective,
        raw_move,
        %clamp_tier,
        expected_move,
        ratio_pressure,
        bearish_filter,
        predicted_price,
        "Prediction computed"
    );

    Ok(PriceProjection {
        predicted_price,
        expected_move,
        ratio_pressure,
        low: predicted_price - range_half_width,
        high: predicted_price + range_half_width,
        breakdown: PredictionBreakdown {
            spot_price: spot,
            rsi: indicators.final_rsi,
            atr: indicators.final_atr,
            volatility_pct: indicators.volatility_pct,
            secondary_avg_short,
            secondary_avg_long,
            secondary_momentum,
            beta_raw: metrics.beta.raw,
            beta_clamped: metrics.beta.clamped,
            beta_fallback,
            beta_effective,
            raw_move,
            clamp_tier,
            clamp_bound,
            correlation_fast: metrics.correlation_fast,
            correlation_slow: metrics.correlation_slow,
            dxy_correlation: metrics.dxy_correlation,
            ratio_current,
            ratio_average,
            ratio_deviation: deviation,
            pressure_multiplier,
            primary_momentum_short,
            primary_momentum_long,
            bearish_filter,
            range_half_width,
        },
    })
}
