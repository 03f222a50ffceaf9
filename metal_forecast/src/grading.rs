//! Post-hoc accuracy grading
//!
//! [`grade`] compares a past forecast with the realised price. Persistence is
//! the caller's concern; [`PredictionRecord`] is the serialisable unit a caller
//! stores and later completes.

use crate::data::Asset;
use crate::error::{ForecastError, Result};
use crate::pipeline::PredictionResult;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence at or above this counts as a high-confidence forecast.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    D,
    F,
}

impl Grade {
    /// Bucket by absolute percentage error.
    pub fn from_error_pct(error_pct: f64) -> Self {
        let e = error_pct.abs();
        if e < 1.0 {
            Grade::APlus
        } else if e < 2.0 {
            Grade::A
        } else if e < 3.0 {
            Grade::BPlus
        } else if e < 4.0 {
            Grade::B
        } else if e < 5.0 {
            Grade::CPlus
        } else if e < 7.0 {
            Grade::C
        } else if e < 10.0 {
            Grade::D
        } else {
            // Also catches NaN
            Grade::F
        }
    }

    pub fn points(self) -> f64 {
        match self {
            Grade::APlus => 4.3,
            Grade::A => 4.0,
            Grade::BPlus => 3.3,
            Grade::B => 3.0,
            Grade::CPlus => 2.3,
            Grade::C => 2.0,
            Grade::D => 1.0,
            Grade::F => 0.0,
        }
    }

    /// Letter for an average of grade points.
    pub fn from_points(points: f64) -> Self {
        if points >= 4.15 {
            Grade::APlus
        } else if points >= 3.65 {
            Grade::A
        } else if points >= 3.15 {
            Grade::BPlus
        } else if points >= 2.65 {
            Grade::B
        } else if points >= 2.15 {
            Grade::CPlus
        } else if points >= 1.5 {
            Grade::C
        } else if points >= 0.5 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeRecord {
    pub predicted_price: f64,
    pub actual_price: f64,
    pub spot_price: f64,
    /// `(actual - predicted) / predicted * 100`
    pub error_pct: f64,
    pub direction_correct: bool,
    pub grade: Grade,
    pub in_range: bool,
    /// Realised change from spot, in percent.
    pub actual_change_pct: f64,
    pub confidence: f64,
}

/// Sign with an explicit zero.
fn direction(delta: f64) -> i8 {
    if delta > 0.0 {
        1
    } else if delta < 0.0 {
        -1
    } else {
        0
    }
}

/// Grade `result` against the price realised at its horizon.
pub fn grade(result: &PredictionResult, actual_price: f64) -> Result<GradeRecord> {
    if !actual_price.is_finite() || actual_price <= 0.0 {
        return Err(ForecastError::ValidationError(format!(
            "Actual price must be positive, got {}",
            actual_price
        )));
    }
    let predicted = result.predicted_price;
    let spot = result.spot_price;
    let error_pct = (actual_price - predicted) / predicted * 100.0;

    Ok(GradeRecord {
        predicted_price: predicted,
        actual_price,
        spot_price: spot,
        error_pct,
        direction_correct: direction(actual_price - spot) == direction(predicted - spot),
        grade: Grade::from_error_pct(error_pct),
        in_range: (result.low..=result.high).contains(&actual_price),
        actual_change_pct: (actual_price - spot) / spot * 100.0,
        confidence: result.confidence,
    })
}

/// A forecast waiting for (or holding) its grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub result: PredictionResult,
    pub issued_on: NaiveDate,
    pub target_date: NaiveDate,
    pub graded: Option<GradeRecord>,
}

impl PredictionRecord {
    /// Target date is `horizon_days` calendar days after issuance.
    pub fn new(result: PredictionResult, issued_on: NaiveDate) -> Self {
        let target_date = issued_on + Duration::days(result.horizon_days as i64);
        Self {
            result,
            issued_on,
            target_date,
            graded: None,
        }
    }

    pub fn key(&self) -> String {
        Self::make_key(self.result.primary, self.result.secondary, self.issued_on)
    }

    pub fn make_key(primary: Asset, secondary: Asset, issued_on: NaiveDate) -> String {
        format!("{}/{}/{}", primary, secondary, issued_on)
    }

    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.graded.is_none() && today >= self.target_date
    }

    /// Grade the record. A record is graded once; later calls are rejected.
    pub fn grade_with(&mut self, actual_price: f64) -> Result<&GradeRecord> {
        if self.graded.is_some() {
            return Err(ForecastError::ValidationError(format!(
                "Prediction {} is already graded",
                self.key()
            )));
        }
        let record = grade(&self.result, actual_price)?;
        tracing::info!(
            key = %self.key(),
            error_pct = record.error_pct,
            grade = %record.grade,
            "Prediction graded"
        );
        Ok(&*self.graded.insert(record))
    }
}

/// Aggregate accuracy over graded forecasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    pub count: usize,
    /// Share of forecasts with the right direction, in percent.
    pub direction_accuracy_pct: f64,
    pub mean_abs_error_pct: f64,
    pub in_range_pct: f64,
    pub average_grade_points: f64,
    pub average_grade: Grade,
    pub high_confidence_count: usize,
    pub high_confidence_mean_abs_error_pct: Option<f64>,
    pub low_confidence_count: usize,
    pub low_confidence_mean_abs_error_pct: Option<f64>,
}

impl AccuracySummary {
    /// `None` for an empty slice.
    pub fn from_records(records: &[GradeRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let n = records.len() as f64;
        let pct = |hits: usize| hits as f64 / n * 100.0;
        let mean_abs = |rs: &[&GradeRecord]| {
            if rs.is_empty() {
                None
            } else {
                Some(rs.iter().map(|r| r.error_pct.abs()).sum::<f64>() / rs.len() as f64)
            }
        };

        let (high, low): (Vec<&GradeRecord>, Vec<&GradeRecord>) = records
            .iter()
            .partition(|r| r.confidence >= HIGH_CONFIDENCE_THRESHOLD);
        let average_grade_points = records.iter().map(|r| r.grade.points()).sum::<f64>() / n;

        Some(Self {
            count: records.len(),
            direction_accuracy_pct: pct(records.iter().filter(|r| r.direction_correct).count()),
            mean_abs_error_pct: records.iter().map(|r| r.error_pct.abs()).sum::<f64>() / n,
            in_range_pct: pct(records.iter().filter(|r| r.in_range).count()),
            average_grade_points,
            average_grade: Grade::from_points(average_grade_points),
            high_confidence_count: high.len(),
            high_confidence_mean_abs_error_pct: mean_abs(&high),
            low_confidence_count: low.len(),
            low_confidence_mean_abs_error_pct: mean_abs(&low),
        })
    }
}

impl fmt::Display for AccuracySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Graded forecasts:   {}", self.count)?;
        writeln!(f, "Direction accuracy: {:.1}%", self.direction_accuracy_pct)?;
        writeln!(f, "Mean |error|:       {:.2}%", self.mean_abs_error_pct)?;
        writeln!(f, "Inside range:       {:.1}%", self.in_range_pct)?;
        write!(
            f,
            "Average grade:      {} ({:.2})",
            self.average_grade, self.average_grade_points
        )
    }
}
