//! Confidence scorer
//!
//! Six independent factors, each a pure function returning a [`FactorScore`]
//! bounded by its weight. The points are summed, normalised by the table
//! total and capped after a regime change.

use crate::config::{ConfidenceConfig, ForecastConfig, WeightTable};
use crate::cross_asset::CrossAssetMetrics;
use crate::data::Asset;
use crate::prediction::PredictionBreakdown;
use crate::regime::{Regime, RegimeInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Correlation,
    DxyHealth,
    RegimeFit,
    RsiRange,
    Volatility,
    RatioStability,
}

impl Factor {
    pub const ALL: [Factor; 6] = [
        Factor::Correlation,
        Factor::DxyHealth,
        Factor::RegimeFit,
        Factor::RsiRange,
        Factor::Volatility,
        Factor::RatioStability,
    ];

    pub fn weight(self, table: &WeightTable) -> f64 {
        match self {
            Factor::Correlation => table.correlation,
            Factor::DxyHealth => table.dxy_health,
            Factor::RegimeFit => table.regime_fit,
            Factor::RsiRange => table.rsi_range,
            Factor::Volatility => table.volatility,
            Factor::RatioStability => table.ratio_stability,
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Factor::Correlation => "Correlation",
            Factor::DxyHealth => "DXY Health",
            Factor::RegimeFit => "Regime Fit",
            Factor::RsiRange => "RSI Range",
            Factor::Volatility => "Volatility",
            Factor::RatioStability => "Ratio Stability",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub score: f64,
    pub max: f64,
    pub rationale: String,
}

impl FactorScore {
    fn new(factor: Factor, fraction: f64, max: f64, rationale: String) -> Self {
        Self {
            factor,
            score: (fraction.clamp(0.0, 1.0) * max).clamp(0.0, max),
            max,
            rationale,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightTableKind {
    Standard,
    Copper,
}

impl WeightTableKind {
    pub fn for_metal(metal: Asset) -> Self {
        if metal == Asset::Copper {
            WeightTableKind::Copper
        } else {
            WeightTableKind::Standard
        }
    }

    pub fn table(self, config: &ConfidenceConfig) -> &WeightTable {
        match self {
            WeightTableKind::Standard => &config.standard,
            WeightTableKind::Copper => &config.copper,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// 0..=100
    pub confidence: f64,
    pub factors: Vec<FactorScore>,
    pub weight_table: WeightTableKind,
    /// Uncapped points over the table total.
    pub points: f64,
    pub max_points: f64,
    /// The regime-change cap lowered the score.
    pub capped: bool,
}

impl ConfidenceReport {
    pub fn factor(&self, factor: Factor) -> Option<&FactorScore> {
        self.factors.iter().find(|f| f.factor == factor)
    }
}

/// 1 up to the full-credit edge, falling linearly to 0 over `span`.
fn fade(distance_past_full: f64, span: f64) -> f64 {
    if distance_past_full <= 0.0 {
        1.0
    } else if span <= 0.0 {
        0.0
    } else {
        1.0 - distance_past_full / span
    }
}

pub fn correlation_score(rho_slow: Option<f64>, max: f64, config: &ConfidenceConfig) -> FactorScore {
    let rationale = match rho_slow {
        Some(rho) => format!("|rho_slow| = {:.3} (full at {:.2})", rho.abs(), config.correlation_full),
        None => "slow correlation undefined".to_string(),
    };
    let rho = rho_slow.unwrap_or(0.0).abs();
    let fraction = if config.correlation_full <= 0.0 {
        1.0
    } else {
        rho / config.correlation_full
    };
    FactorScore::new(Factor::Correlation, fraction, max, rationale)
}

pub fn dxy_score(rho_dxy: Option<f64>, max: f64, config: &ConfidenceConfig) -> FactorScore {
    let Some(rho) = rho_dxy else {
        return FactorScore::new(Factor::DxyHealth, 0.0, max, "DXY correlation undefined".to_string());
    };
    let fraction = if rho <= config.dxy_full {
        1.0
    } else if rho < 0.0 {
        rho / config.dxy_full
    } else {
        0.0
    };
    let rationale = format!("DXY correlation {:.3} (full at <= {:.2})", rho, config.dxy_full);
    FactorScore::new(Factor::DxyHealth, fraction, max, rationale)
}

pub fn regime_fit_score(
    regime: Regime,
    secondary: Asset,
    ratio_deviation: f64,
    max: f64,
    config: &ConfidenceConfig,
) -> FactorScore {
    let fits = match regime {
        Regime::Bull => secondary == Asset::Gold,
        Regime::Bear => secondary == Asset::Sp500,
        Regime::Sideways => ratio_deviation.abs() < config.sideways_ratio_band,
    };
    let rationale = format!(
        "{} with {} secondary{}",
        regime,
        secondary,
        if fits { " fits" } else { " does not fit" }
    );
    FactorScore::new(Factor::RegimeFit, if fits { 1.0 } else { 0.0 }, max, rationale)
}

pub fn rsi_score(rsi: f64, max: f64, config: &ConfidenceConfig) -> FactorScore {
    let fraction = if rsi < config.rsi_full_low {
        fade(config.rsi_full_low - rsi, config.rsi_full_low - config.rsi_zero_low)
    } else if rsi > config.rsi_full_high {
        fade(rsi - config.rsi_full_high, config.rsi_zero_high - config.rsi_full_high)
    } else {
        1.0
    };
    let rationale = format!(
        "RSI {:.1} (full in [{:.0}, {:.0}])",
        rsi, config.rsi_full_low, config.rsi_full_high
    );
    FactorScore::new(Factor::RsiRange, fraction, max, rationale)
}

pub fn volatility_score(volatility_pct: f64, max: f64, config: &ConfidenceConfig) -> FactorScore {
    let fraction = fade(
        volatility_pct - config.volatility_full_pct,
        config.volatility_zero_pct - config.volatility_full_pct,
    );
    let rationale = format!(
        "volatility {:.2}% (full below {:.1}%)",
        volatility_pct, config.volatility_full_pct
    );
    FactorScore::new(Factor::Volatility, fraction, max, rationale)
}

pub fn ratio_stability_score(ratio_deviation: f64, max: f64, config: &ConfidenceConfig) -> FactorScore {
    let d = ratio_deviation.abs();
    let fraction = fade(d - config.ratio_full, config.ratio_zero - config.ratio_full);
    let rationale = format!(
        "ratio deviation {:.2}% (full below {:.1}%)",
        d * 100.0,
        config.ratio_full * 100.0
    );
    FactorScore::new(Factor::RatioStability, fraction, max, rationale)
}

/// Score a prediction of `metal` against `secondary`.
pub fn score(
    metal: Asset,
    secondary: Asset,
    metrics: &CrossAssetMetrics,
    regime: &RegimeInfo,
    breakdown: &PredictionBreakdown,
    config: &ForecastConfig,
) -> ConfidenceReport {
    let k = &config.confidence;
    let weight_table = WeightTableKind::for_metal(metal);
    let table = weight_table.table(k);

    let factors: Vec<FactorScore> = Factor::ALL
        .iter()
        .map(|&factor| {
            let max = factor.weight(table);
            match factor {
                Factor::Correlation => correlation_score(metrics.correlation_slow, max, k),
                Factor::DxyHealth => dxy_score(metrics.dxy_correlation, max, k),
                Factor::RegimeFit => {
                    regime_fit_score(regime.regime, secondary, breakdown.ratio_deviation, max, k)
                }
                Factor::RsiRange => rsi_score(breakdown.rsi, max, k),
                Factor::Volatility => volatility_score(breakdown.volatility_pct, max, k),
                Factor::RatioStability => ratio_stability_score(breakdown.ratio_deviation, max, k),
            }
        })
        .collect();

    let points: f64 = factors.iter().map(|f| f.score).sum();
    let max_points = table.total();
    let normalised = (points / max_points * 100.0).clamp(0.0, 100.0);

    let (confidence, capped) = if regime.regime_change && normalised > k.regime_change_cap {
        tracing::warn!(
            uncapped = normalised,
            cap = k.regime_change_cap,
            "Regime change caps confidence"
        );
        (k.regime_change_cap, true)
    } else {
        (normalised, false)
    };

    tracing::debug!(
        confidence,
        points,
        max_points,
        capped,
        table = ?weight_table,
        "Confidence scored"
    );

    ConfidenceReport {
        confidence,
        factors,
        weight_table,
        points,
        max_points,
        capped,
    }
}
