//! Walk-forward backtest of the forecast pipeline
//!
//! Each test date sees only bars dated on or before it; the forecast is then
//! graded against the primary close `horizon_days` trading bars later.

use crate::error::{ForecastError, Result};
use crate::grading::{grade, AccuracySummary, Grade};
use crate::pipeline::{ForecastInputs, Forecaster};
use crate::regime::Regime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One graded walk-forward forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    /// Date the forecast was issued
    pub date: NaiveDate,
    /// Date of the realised close
    pub target_date: NaiveDate,
    pub spot_price: f64,
    pub predicted_price: f64,
    pub low: f64,
    pub high: f64,
    pub actual_price: f64,
    pub confidence: f64,
    pub regime: Regime,
    pub regime_change: bool,
    pub error_pct: f64,
    pub direction_correct: bool,
    pub grade: Grade,
    pub in_range: bool,
}

/// Backtest output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub rows: Vec<BacktestRow>,
    /// `None` when no date could be forecast.
    pub summary: Option<AccuracySummary>,
    /// Dates skipped for lack of history.
    pub skipped: usize,
}

impl BacktestReport {
    /// Write the rows as CSV with a header line.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for row in &self.rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Walk-forward driver around a [`Forecaster`].
#[derive(Debug, Clone)]
pub struct Backtester {
    forecaster: Forecaster,
    step: usize,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

impl Backtester {
    pub fn new(forecaster: Forecaster) -> Self {
        Self {
            forecaster,
            step: 1,
            start: None,
            end: None,
        }
    }

    /// Forecast every `step`-th eligible date.
    pub fn with_step(mut self, step: usize) -> Result<Self> {
        if step == 0 {
            return Err(ForecastError::ValidationError(
                "Backtest step must be greater than zero".to_string(),
            ));
        }
        self.step = step;
        Ok(self)
    }

    /// Restrict issuance dates to `[start, end]`.
    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn run(&self, inputs: &ForecastInputs) -> Result<BacktestReport> {
        let horizon = self.forecaster.config().windows.horizon_days;
        let bars = inputs.primary.bars();
        let mut rows = Vec::new();
        let mut graded = Vec::new();
        let mut skipped = 0;

        let last_issuable = bars.len().saturating_sub(horizon);
        for i in (0..last_issuable).step_by(self.step) {
            let date = bars[i].date;
            if self.start.is_some_and(|s| date < s) || self.end.is_some_and(|e| date > e) {
                continue;
            }
            let target = bars[i + horizon];

            let result = match self.forecaster.forecast(&inputs.truncated_to(date)) {
                Ok(result) => result,
                Err(ForecastError::InsufficientData { .. }) => {
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let record = grade(&result, target.close)?;

            rows.push(BacktestRow {
                date,
                target_date: target.date,
                spot_price: result.spot_price,
                predicted_price: result.predicted_price,
                low: result.low,
                high: result.high,
                actual_price: target.close,
                confidence: result.confidence,
                regime: result.regime,
                regime_change: result.regime_change,
                error_pct: record.error_pct,
                direction_correct: record.direction_correct,
                grade: record.grade,
                in_range: record.in_range,
            });
            graded.push(record);
        }

        let summary = AccuracySummary::from_records(&graded);

        tracing::info!(
            forecasts = rows.len(),
            skipped,
            average_grade = ?summary.as_ref().map(|s| s.average_grade),
            "Backtest finished"
        );

        Ok(BacktestReport {
            rows,
            summary,
            skipped,
        })
    }
}
