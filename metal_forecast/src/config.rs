//! Pipeline configuration
//!
//! Every window length, threshold, clamp tier and confidence weight the
//! pipeline uses lives in one immutable [`ForecastConfig`]. The defaults are
//! the production constants; a TOML file may override any subset of them.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub windows: WindowConfig,
    pub regime: RegimeConfig,
    pub prediction: PredictionConfig,
    pub confidence: ConfidenceConfig,
}

/// Lookback lengths, in trading days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub rsi_period: usize,
    pub atr_period: usize,
    pub beta: usize,
    pub correlation_fast: usize,
    pub correlation_slow: usize,
    pub dxy_correlation: usize,
    pub regime_ma: usize,
    pub momentum_short: usize,
    pub momentum_long: usize,
    pub primary_momentum: usize,
    pub ratio_average: usize,
    /// Forecast horizon; also the range scaling factor `sqrt(horizon)`.
    pub horizon_days: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            atr_period: 14,
            beta: 60,
            correlation_fast: 10,
            correlation_slow: 60,
            dxy_correlation: 14,
            regime_ma: 50,
            momentum_short: 7,
            momentum_long: 14,
            primary_momentum: 14,
            ratio_average: 28,
            horizon_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    /// Inclusive RSI band that forces SIDEWAYS.
    pub sideways_rsi_low: f64,
    pub sideways_rsi_high: f64,
    /// `|rho_fast - rho_slow|` above this flags a regime change.
    pub correlation_divergence: f64,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            sideways_rsi_low: 45.0,
            sideways_rsi_high: 55.0,
            correlation_divergence: 0.30,
        }
    }
}

/// Expected-move bounds, as fractions of spot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClampTiers {
    pub normal: f64,
    pub elevated: f64,
    pub crisis: f64,
}

impl Default for ClampTiers {
    fn default() -> Self {
        Self {
            normal: 0.10,
            elevated: 0.15,
            crisis: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub beta_min: f64,
    pub beta_max: f64,
    /// Used for the move when beta is undefined (flat secondary).
    pub fallback_beta: f64,
    /// Beta multiplier in BEAR or after a regime change.
    pub beta_shrink: f64,
    /// Extra damper on the raw move in BEAR.
    pub bear_safety_factor: f64,
    pub volatility_elevated_pct: f64,
    pub volatility_crisis_pct: f64,
    /// Ratio pressure multiplier per unit of slow correlation.
    pub pressure_factor: f64,
    pub sideways_pressure_boost: f64,
    pub clamp: ClampTiers,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            beta_min: 0.1,
            beta_max: 5.0,
            fallback_beta: 1.0,
            beta_shrink: 0.7,
            bear_safety_factor: 0.8,
            clamp: ClampTiers::default(),
            volatility_elevated_pct: 4.0,
            volatility_crisis_pct: 8.0,
            pressure_factor: 0.15,
            sideways_pressure_boost: 2.0,
        }
    }
}

/// Maximum points per confidence factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    pub correlation: f64,
    pub dxy_health: f64,
    pub regime_fit: f64,
    pub rsi_range: f64,
    pub volatility: f64,
    pub ratio_stability: f64,
}

impl WeightTable {
    pub fn standard() -> Self {
        Self {
            correlation: 50.0,
            dxy_health: 15.0,
            regime_fit: 15.0,
            rsi_range: 10.0,
            volatility: 10.0,
            ratio_stability: 10.0,
        }
    }

    /// Copper tracks the dollar less closely than the precious metals.
    pub fn copper() -> Self {
        Self {
            dxy_health: 5.0,
            ..Self::standard()
        }
    }

    pub fn total(&self) -> f64 {
        self.correlation
            + self.dxy_health
            + self.regime_fit
            + self.rsi_range
            + self.volatility
            + self.ratio_stability
    }

    fn standard_overrides<'de, D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(WeightOverrides::deserialize(deserializer)?.apply(Self::standard()))
    }

    fn copper_overrides<'de, D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(WeightOverrides::deserialize(deserializer)?.apply(Self::copper()))
    }

    fn weights(&self) -> [f64; 6] {
        [
            self.correlation,
            self.dxy_health,
            self.regime_fit,
            self.rsi_range,
            self.volatility,
            self.ratio_stability,
        ]
    }
}

/// A partial weight table read from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct WeightOverrides {
    correlation: Option<f64>,
    dxy_health: Option<f64>,
    regime_fit: Option<f64>,
    rsi_range: Option<f64>,
    volatility: Option<f64>,
    ratio_stability: Option<f64>,
}

impl WeightOverrides {
    fn apply(self, base: WeightTable) -> WeightTable {
        WeightTable {
            correlation: self.correlation.unwrap_or(base.correlation),
            dxy_health: self.dxy_health.unwrap_or(base.dxy_health),
            regime_fit: self.regime_fit.unwrap_or(base.regime_fit),
            rsi_range: self.rsi_range.unwrap_or(base.rsi_range),
            volatility: self.volatility.unwrap_or(base.volatility),
            ratio_stability: self.ratio_stability.unwrap_or(base.ratio_stability),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// `|rho_slow|` at or above this earns full correlation points.
    pub correlation_full: f64,
    /// DXY correlation at or below this earns full DXY points.
    pub dxy_full: f64,
    pub rsi_full_low: f64,
    pub rsi_full_high: f64,
    pub rsi_zero_low: f64,
    pub rsi_zero_high: f64,
    pub volatility_full_pct: f64,
    pub volatility_zero_pct: f64,
    pub ratio_full: f64,
    pub ratio_zero: f64,
    /// Ratio deviation band that makes SIDEWAYS a regime fit.
    pub sideways_ratio_band: f64,
    pub regime_change_cap: f64,
    /// Keys missing from a `[confidence.standard]` table keep their defaults.
    #[serde(deserialize_with = "WeightTable::standard_overrides")]
    pub standard: WeightTable,
    #[serde(deserialize_with = "WeightTable::copper_overrides")]
    pub copper: WeightTable,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            standard: WeightTable::standard(),
            copper: WeightTable::copper(),
            correlation_full: 0.7,
            dxy_full: -0.5,
            rsi_full_low: 30.0,
            rsi_full_high: 70.0,
            rsi_zero_low: 20.0,
            rsi_zero_high: 80.0,
            volatility_full_pct: 2.0,
            volatility_zero_pct: 4.0,
            ratio_full: 0.05,
            ratio_zero: 0.15,
            sideways_ratio_band: 0.10,
            regime_change_cap: 50.0,
        }
    }
}

impl ForecastConfig {
    /// Parse a (possibly partial) TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "Loaded forecast config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let w = &self.windows;
        let named = [
            ("rsi_period", w.rsi_period),
            ("atr_period", w.atr_period),
            ("beta", w.beta),
            ("correlation_fast", w.correlation_fast),
            ("correlation_slow", w.correlation_slow),
            ("dxy_correlation", w.dxy_correlation),
            ("regime_ma", w.regime_ma),
            ("momentum_short", w.momentum_short),
            ("momentum_long", w.momentum_long),
            ("primary_momentum", w.primary_momentum),
            ("ratio_average", w.ratio_average),
            ("horizon_days", w.horizon_days),
        ];
        if let Some((name, _)) = named.iter().find(|(_, v)| *v == 0) {
            return Err(ForecastError::ConfigError(format!(
                "window `{}` must be greater than zero",
                name
            )));
        }
        // Correlation and log-return statistics need at least two returns
        for (name, v) in [
            ("beta", w.beta),
            ("correlation_fast", w.correlation_fast),
            ("correlation_slow", w.correlation_slow),
            ("dxy_correlation", w.dxy_correlation),
        ] {
            if v < 2 {
                return Err(ForecastError::ConfigError(format!(
                    "window `{}` must cover at least 2 returns",
                    name
                )));
            }
        }

        let r = &self.regime;
        if r.sideways_rsi_low > r.sideways_rsi_high {
            return Err(ForecastError::ConfigError(
                "sideways RSI band is inverted".to_string(),
            ));
        }
        if r.correlation_divergence < 0.0 {
            return Err(ForecastError::ConfigError(
                "correlation divergence must be non-negative".to_string(),
            ));
        }

        let p = &self.prediction;
        if !(p.beta_min > 0.0 && p.beta_min <= p.beta_max) {
            return Err(ForecastError::ConfigError(
                "beta bounds must satisfy 0 < beta_min <= beta_max".to_string(),
            ));
        }
        let c = &p.clamp;
        if !(c.normal > 0.0 && c.normal <= c.elevated && c.elevated <= c.crisis) {
            return Err(ForecastError::ConfigError(
                "clamp tiers must satisfy 0 < normal <= elevated <= crisis".to_string(),
            ));
        }
        if p.volatility_elevated_pct > p.volatility_crisis_pct {
            return Err(ForecastError::ConfigError(
                "elevated volatility threshold exceeds crisis threshold".to_string(),
            ));
        }

        let k = &self.confidence;
        for table in [&k.standard, &k.copper] {
            if table.weights().iter().any(|v| *v < 0.0) || table.total() <= 0.0 {
                return Err(ForecastError::ConfigError(
                    "confidence weights must be non-negative with a positive total".to_string(),
                ));
            }
        }
        if !(k.rsi_zero_low <= k.rsi_full_low && k.rsi_full_high <= k.rsi_zero_high) {
            return Err(ForecastError::ConfigError(
                "RSI partial-credit band must enclose the full-credit band".to_string(),
            ));
        }
        if k.volatility_full_pct > k.volatility_zero_pct || k.ratio_full > k.ratio_zero {
            return Err(ForecastError::ConfigError(
                "full-credit thresholds must not exceed zero-credit thresholds".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&k.regime_change_cap) {
            return Err(ForecastError::ConfigError(
                "regime change cap must lie in [0, 100]".to_string(),
            ));
        }

        Ok(())
    }

    /// Bars needed by the indicator engine (seed plus one step).
    pub fn min_indicator_bars(&self) -> usize {
        self.windows.rsi_period.max(self.windows.atr_period) + 1
    }

    /// Aligned primary/secondary bars needed for beta and both correlations.
    pub fn min_cross_asset_bars(&self) -> usize {
        let w = &self.windows;
        w.beta.max(w.correlation_fast).max(w.correlation_slow) + 1
    }

    pub fn min_dxy_bars(&self) -> usize {
        self.windows.dxy_correlation + 1
    }

    pub fn min_ratio_bars(&self) -> usize {
        self.windows.ratio_average + 1
    }

    pub fn min_regime_bars(&self) -> usize {
        self.windows.regime_ma + 1
    }
}
