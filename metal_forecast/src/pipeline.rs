//! Forecast pipeline assembly
//!
//! [`Forecaster`] checks every stage's minimum window up front, then runs the
//! indicator engine, cross-asset metrics, regime detector, prediction engine
//! and confidence scorer in order. Nothing is cached between calls.

use crate::confidence::{self, ConfidenceReport};
use crate::config::ForecastConfig;
use crate::cross_asset::{compute_metrics_aligned, CrossAssetMetrics};
use crate::data::{align_closes, AlignedCloses, Asset, DataQualityNote, PriceSeries};
use crate::error::{ForecastError, Result};
use crate::indicators::compute_indicators;
use crate::prediction::{predict, MarketContext, PredictionBreakdown};
use crate::regime::{detect_regime, Regime, RegimeInfo};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Series for one forecast request.
#[derive(Debug, Clone)]
pub struct ForecastInputs {
    pub primary_asset: Asset,
    pub secondary_asset: Asset,
    /// The metal being forecast, per unit mass.
    pub primary: PriceSeries,
    pub secondary: PriceSeries,
    /// Currency-strength index.
    pub dxy: PriceSeries,
    /// Broad-market index for the regime; the secondary series is used when absent.
    pub market_index: Option<PriceSeries>,
}

impl ForecastInputs {
    pub fn new(
        primary_asset: Asset,
        secondary_asset: Asset,
        primary: PriceSeries,
        secondary: PriceSeries,
        dxy: PriceSeries,
    ) -> Self {
        Self {
            primary_asset,
            secondary_asset,
            primary,
            secondary,
            dxy,
            market_index: None,
        }
    }

    pub fn with_market_index(mut self, index: PriceSeries) -> Self {
        self.market_index = Some(index);
        self
    }

    pub fn market_index(&self) -> &PriceSeries {
        self.market_index.as_ref().unwrap_or(&self.secondary)
    }

    /// The same request restricted to bars dated on or before `date`.
    pub fn truncated_to(&self, date: NaiveDate) -> Self {
        Self {
            primary_asset: self.primary_asset,
            secondary_asset: self.secondary_asset,
            primary: self.primary.truncated_to(date),
            secondary: self.secondary.truncated_to(date),
            dxy: self.dxy.truncated_to(date),
            market_index: self.market_index.as_ref().map(|s| s.truncated_to(date)),
        }
    }
}

/// One emitted forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub primary: Asset,
    pub secondary: Asset,
    /// Date of the spot bar.
    pub as_of: NaiveDate,
    pub horizon_days: usize,
    pub spot_price: f64,
    pub predicted_price: f64,
    /// Percentage change of the forecast from spot.
    pub change_pct: f64,
    pub expected_move: f64,
    pub ratio_pressure: f64,
    pub low: f64,
    pub high: f64,
    pub confidence: f64,
    pub regime: Regime,
    pub regime_change: bool,
    pub regime_info: RegimeInfo,
    pub metrics: CrossAssetMetrics,
    pub breakdown: PredictionBreakdown,
    pub confidence_report: ConfidenceReport,
    pub notes: Vec<DataQualityNote>,
}

impl PredictionResult {
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs the full pipeline with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn forecast(&self, inputs: &ForecastInputs) -> Result<PredictionResult> {
        let config = &self.config;
        if !inputs.primary_asset.is_metal() {
            return Err(ForecastError::ValidationError(format!(
                "{} cannot be forecast; the primary asset must be a metal",
                inputs.primary_asset
            )));
        }
        if inputs.primary_asset == inputs.secondary_asset {
            return Err(ForecastError::ValidationError(format!(
                "Primary and secondary are both {}",
                inputs.primary_asset
            )));
        }

        let pair = align_closes(&inputs.primary, &inputs.secondary, "primary/secondary");
        let currency = align_closes(&inputs.primary, &inputs.dxy, "primary/currency index");
        self.check_windows(inputs, &pair, &currency)?;

        let indicators = compute_indicators(&inputs.primary, &config.windows)?;
        let metrics = compute_metrics_aligned(&pair, &currency, config)?;

        let index_closes = inputs.market_index().closes();
        let regime = detect_regime(
            &index_closes,
            indicators.final_rsi,
            metrics.rho_fast(),
            metrics.rho_slow(),
            config,
        )?;

        let primary_closes = inputs.primary.closes();
        let secondary_closes = inputs.secondary.closes();
        let spot = indicators.last_close;
        let projection = predict(
            spot,
            &metrics,
            &indicators,
            &regime,
            MarketContext {
                primary_closes: &primary_closes,
                secondary_closes: &secondary_closes,
                pair: &pair,
            },
            config,
        )?;

        let report = confidence::score(
            inputs.primary_asset,
            inputs.secondary_asset,
            &metrics,
            &regime,
            &projection.breakdown,
            config,
        );

        let as_of = inputs
            .primary
            .last_date()
            .ok_or_else(|| ForecastError::DataError("Primary series is empty".to_string()))?;

        tracing::info!(
            primary = %inputs.primary_asset,
            secondary = %inputs.secondary_asset,
            %as_of,
            spot,
            predicted = projection.predicted_price,
            confidence = report.confidence,
            regime = %regime.regime,
            "Forecast issued"
        );

        Ok(PredictionResult {
            primary: inputs.primary_asset,
            secondary: inputs.secondary_asset,
            as_of,
            horizon_days: config.windows.horizon_days,
            spot_price: spot,
            predicted_price: projection.predicted_price,
            change_pct: (projection.predicted_price - spot) / spot * 100.0,
            expected_move: projection.expected_move,
            ratio_pressure: projection.ratio_pressure,
            low: projection.low,
            high: projection.high,
            confidence: report.confidence,
            regime: regime.regime,
            regime_change: regime.regime_change,
            notes: metrics.notes.clone(),
            regime_info: regime,
            metrics,
            breakdown: projection.breakdown,
            confidence_report: report,
        })
    }

    /// Every stage minimum, checked before any computation runs.
    fn check_windows(
        &self,
        inputs: &ForecastInputs,
        pair: &AlignedCloses,
        currency: &AlignedCloses,
    ) -> Result<()> {
        let config = &self.config;
        let w = &config.windows;
        let checks = [
            (
                format!("{}-period RSI/ATR seed", w.rsi_period.max(w.atr_period)),
                config.min_indicator_bars(),
                inputs.primary.len(),
            ),
            (
                format!("{}-day primary momentum", w.primary_momentum.max(w.momentum_short)),
                w.primary_momentum.max(w.momentum_short) + 1,
                inputs.primary.len(),
            ),
            (
                format!("{}-day secondary momentum", w.momentum_long.max(w.momentum_short)),
                w.momentum_long.max(w.momentum_short),
                inputs.secondary.len(),
            ),
            (
                format!(
                    "{}-day beta/correlation window (primary/secondary aligned)",
                    config.min_cross_asset_bars() - 1
                ),
                config.min_cross_asset_bars(),
                pair.len(),
            ),
            (
                format!("{}-day price ratio average", w.ratio_average),
                config.min_ratio_bars(),
                pair.len(),
            ),
            (
                format!(
                    "{}-day currency-index correlation (primary/DXY aligned)",
                    w.dxy_correlation
                ),
                config.min_dxy_bars(),
                currency.len(),
            ),
            (
                format!("{}-day market index moving average", w.regime_ma),
                config.min_regime_bars(),
                inputs.market_index().len(),
            ),
        ];
        for (window, required, available) in checks {
            if available < required {
                tracing::warn!(%window, required, available, "Insufficient data");
                return Err(ForecastError::insufficient(window, required, available));
            }
        }
        Ok(())
    }
}
