//! Cross-asset statistics over daily log returns
//!
//! Pairs are aligned on shared dates first; each statistic then uses the last
//! `window` log returns of the aligned closes. A zero-variance denominator is
//! not an error: the affected beta or correlation is reported as `None`.

use crate::config::ForecastConfig;
use crate::data::{align_closes, AlignedCloses, DataQualityNote, PriceSeries};
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use trade_math::statistics::{log_returns, PairStatistics};

/// Beta of primary returns on secondary returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaEstimate {
    pub window: usize,
    /// `Cov(P, S) / Var(S)`; `None` when `Var(S) = 0`.
    pub raw: Option<f64>,
    /// `raw` clamped to the configured bounds.
    pub clamped: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossAssetMetrics {
    pub beta: BetaEstimate,
    /// Primary/secondary correlation keyed by window length.
    pub correlation_window: BTreeMap<usize, Option<f64>>,
    pub correlation_fast: Option<f64>,
    pub correlation_slow: Option<f64>,
    /// Primary/currency-index correlation.
    pub dxy_correlation: Option<f64>,
    pub notes: Vec<DataQualityNote>,
}

impl CrossAssetMetrics {
    /// Fast correlation, with an undefined value read as no correlation.
    pub fn rho_fast(&self) -> f64 {
        self.correlation_fast.unwrap_or(0.0)
    }

    pub fn rho_slow(&self) -> f64 {
        self.correlation_slow.unwrap_or(0.0)
    }

    pub fn rho_dxy(&self) -> f64 {
        self.dxy_correlation.unwrap_or(0.0)
    }
}

/// Moments of the last `window` aligned log returns.
pub fn window_statistics(aligned: &AlignedCloses, window: usize, label: &str) -> Result<PairStatistics> {
    if aligned.len() < window + 1 {
        return Err(ForecastError::insufficient(
            format!("{}-day {} window", window, label),
            window + 1,
            aligned.len(),
        ));
    }
    let start = aligned.len() - (window + 1);
    let x = log_returns(&aligned.left()[start..])?;
    let y = log_returns(&aligned.right()[start..])?;
    Ok(PairStatistics::from_samples(&x, &y)?)
}

/// Beta, dual-window correlation and the currency-index correlation.
pub fn compute_metrics(
    primary: &PriceSeries,
    secondary: &PriceSeries,
    dxy: &PriceSeries,
    config: &ForecastConfig,
) -> Result<CrossAssetMetrics> {
    let pair = align_closes(primary, secondary, "primary/secondary");
    let currency = align_closes(primary, dxy, "primary/currency index");
    compute_metrics_aligned(&pair, &currency, config)
}

/// [`compute_metrics`] over closes that are already date-aligned.
///
/// `pair` holds primary (left) against secondary (right); `currency` holds
/// primary (left) against the currency index (right).
pub fn compute_metrics_aligned(
    pair: &AlignedCloses,
    currency: &AlignedCloses,
    config: &ForecastConfig,
) -> Result<CrossAssetMetrics> {
    let w = &config.windows;
    let p = &config.prediction;

    let beta_stats = window_statistics(pair, w.beta, "beta (primary/secondary aligned)")?;
    let raw = beta_stats.beta();
    if raw.is_none() {
        tracing::warn!(window = w.beta, "Secondary returns have zero variance; beta undefined");
    }
    let beta = BetaEstimate {
        window: w.beta,
        raw,
        clamped: raw.map(|b| b.clamp(p.beta_min, p.beta_max)),
    };

    let mut correlation_window = BTreeMap::new();
    for window in [w.correlation_fast, w.correlation_slow] {
        if correlation_window.contains_key(&window) {
            continue;
        }
        let rho = if window == w.beta {
            beta_stats.correlation()
        } else {
            window_statistics(pair, window, "correlation (primary/secondary aligned)")?
                .correlation()
        };
        if rho.is_none() {
            tracing::warn!(window, "Zero-variance returns; correlation undefined");
        }
        correlation_window.insert(window, rho);
    }

    let dxy_correlation = window_statistics(
        currency,
        w.dxy_correlation,
        "currency-index correlation (primary/DXY aligned)",
    )?
    .correlation();
    if dxy_correlation.is_none() {
        tracing::warn!(window = w.dxy_correlation, "Zero-variance returns; DXY correlation undefined");
    }

    let notes = [pair.note(), currency.note()]
        .into_iter()
        .flatten()
        .cloned()
        .collect();

    let metrics = CrossAssetMetrics {
        correlation_fast: correlation_window[&w.correlation_fast],
        correlation_slow: correlation_window[&w.correlation_slow],
        beta,
        correlation_window,
        dxy_correlation,
        notes,
    };
    tracing::debug!(
        beta_raw = ?metrics.beta.raw,
        beta_clamped = ?metrics.beta.clamped,
        rho_fast = ?metrics.correlation_fast,
        rho_slow = ?metrics.correlation_slow,
        rho_dxy = ?metrics.dxy_correlation,
        "Cross-asset metrics computed"
    );
    Ok(metrics)
}
