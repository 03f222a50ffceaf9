//! Indicator engine: RSI and ATR with Wilder smoothing
//!
//! The recursion is a fold over the ordered bars. The seed is the simple mean
//! of the first `period` gains, losses and true ranges; every later bar moves
//! the accumulator by one Wilder step. The fold yields both the final
//! [`IndicatorState`] and the full history, so nothing is kept between calls.

use crate::config::WindowConfig;
use crate::data::PriceSeries;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use trade_math::moving_averages::{wilder_seed, wilder_step};
use trade_math::oscillators::{gains_and_losses, rsi_from_averages};
use trade_math::volatility::{true_ranges, volatility_percent};

/// Wilder accumulator after a given bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorState {
    pub avg_gain: f64,
    pub avg_loss: f64,
    pub atr: f64,
}

impl IndicatorState {
    pub fn rsi(&self) -> f64 {
        rsi_from_averages(self.avg_gain, self.avg_loss)
    }

    fn step(self, gain: f64, loss: f64, tr: f64, windows: &WindowConfig) -> Self {
        Self {
            avg_gain: wilder_step(self.avg_gain, gain, windows.rsi_period),
            avg_loss: wilder_step(self.avg_loss, loss, windows.rsi_period),
            atr: wilder_step(self.atr, tr, windows.atr_period),
        }
    }
}

/// Indicator history for one series.
///
/// `states[i]`, `rsi[i]` and `atr[i]` all belong to the bar dated `dates[i]`;
/// the first entry is the seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub dates: Vec<NaiveDate>,
    pub states: Vec<IndicatorState>,
    pub rsi: Vec<f64>,
    pub atr: Vec<f64>,
    pub final_rsi: f64,
    pub final_atr: f64,
    pub last_close: f64,
    /// `final_atr / last_close * 100`
    pub volatility_pct: f64,
}

/// Run the Wilder fold over `series`.
///
/// Needs `max(rsi_period, atr_period) + 1` bars; shorter input is an error,
/// never padded.
pub fn compute_indicators(series: &PriceSeries, windows: &WindowConfig) -> Result<IndicatorSeries> {
    let period = windows.rsi_period.max(windows.atr_period);
    if series.len() < period + 1 {
        return Err(ForecastError::insufficient(
            format!("{}-period RSI/ATR seed", period),
            period + 1,
            series.len(),
        ));
    }

    let closes = series.closes();
    let (gains, losses) = gains_and_losses(&closes);
    let trs = true_ranges(&series.highs(), &series.lows(), &closes)?;

    // Each average is seeded on its own period, then brought forward to the
    // common starting change so that both run in lockstep.
    let mut avg_gain = wilder_seed(&gains, windows.rsi_period)?;
    let mut avg_loss = wilder_seed(&losses, windows.rsi_period)?;
    for k in windows.rsi_period..period {
        avg_gain = wilder_step(avg_gain, gains[k], windows.rsi_period);
        avg_loss = wilder_step(avg_loss, losses[k], windows.rsi_period);
    }
    let mut atr = wilder_seed(&trs, windows.atr_period)?;
    for tr in &trs[windows.atr_period..period] {
        atr = wilder_step(atr, *tr, windows.atr_period);
    }
    let seed = IndicatorState {
        avg_gain,
        avg_loss,
        atr,
    };

    let states: Vec<IndicatorState> = std::iter::once(seed)
        .chain((period..gains.len()).scan(seed, |state, k| {
            *state = state.step(gains[k], losses[k], trs[k], windows);
            Some(*state)
        }))
        .collect();

    let dates = series.bars()[period..].iter().map(|b| b.date).collect();
    let rsi: Vec<f64> = states.iter().map(IndicatorState::rsi).collect();
    let atr: Vec<f64> = states.iter().map(|s| s.atr).collect();

    let last = states[states.len() - 1];
    let last_close = closes[closes.len() - 1];
    let volatility_pct = volatility_percent(last.atr, last_close)?;

    tracing::debug!(
        rsi = last.rsi(),
        atr = last.atr,
        volatility_pct,
        "Indicators computed"
    );

    Ok(IndicatorSeries {
        dates,
        final_rsi: last.rsi(),
        final_atr: last.atr,
        states,
        rsi,
        atr,
        last_close,
        volatility_pct,
    })
}
