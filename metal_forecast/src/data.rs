//! Price series handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Instruments the pipeline knows how to pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Gold,
    Silver,
    Platinum,
    Copper,
    #[serde(rename = "S&P 500")]
    Sp500,
}

impl Asset {
    /// Whether the asset can be the primary (forecast) instrument.
    pub fn is_metal(self) -> bool {
        !matches!(self, Asset::Sp500)
    }

    pub fn name(self) -> &'static str {
        match self {
            Asset::Gold => "Gold",
            Asset::Silver => "Silver",
            Asset::Platinum => "Platinum",
            Asset::Copper => "Copper",
            Asset::Sp500 => "S&P 500",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Asset {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "gold" | "xau" => Ok(Asset::Gold),
            "silver" | "xag" => Ok(Asset::Silver),
            "platinum" | "xpt" => Ok(Asset::Platinum),
            "copper" | "xcu" => Ok(Asset::Copper),
            "s&p500" | "sp500" | "spx" | "^gspc" => Ok(Asset::Sp500),
            _ => Err(ForecastError::ValidationError(format!(
                "Unknown asset: {}",
                s
            ))),
        }
    }
}

/// Quote basis of a series. Conversion between units happens upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceUnit {
    PerGram,
    PerTroyOunce,
    PerPound,
    IndexPoints,
}

/// One daily OHLC bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(alias = "Date")]
    pub date: NaiveDate,
    #[serde(alias = "Open")]
    pub open: f64,
    #[serde(alias = "High")]
    pub high: f64,
    #[serde(alias = "Low")]
    pub low: f64,
    #[serde(alias = "Close")]
    pub close: f64,
}

impl PriceBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
        }
    }

    /// A bar carrying only a close (index series without ranges).
    pub fn flat(date: NaiveDate, close: f64) -> Self {
        Self::new(date, close, close, close, close)
    }
}

/// Date-ordered bars of a single instrument.
///
/// Construction validates that dates strictly increase and that every price is
/// finite and positive with `high >= low`. A series is immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    unit: PriceUnit,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(unit: PriceUnit, bars: Vec<PriceBar>) -> Result<Self> {
        for (i, bar) in bars.iter().enumerate() {
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
                return Err(ForecastError::DataError(format!(
                    "Bar {} ({}) has a non-positive or non-finite price",
                    i, bar.date
                )));
            }
            if bar.high < bar.low {
                return Err(ForecastError::DataError(format!(
                    "Bar {} ({}) has high {} below low {}",
                    i, bar.date, bar.high, bar.low
                )));
            }
        }
        if let Some(w) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
            return Err(ForecastError::DataError(format!(
                "Dates must strictly increase: {} follows {}",
                w[1].date, w[0].date
            )));
        }

        Ok(Self { unit, bars })
    }

    /// Build a close-only series from parallel dates and closes.
    pub fn from_closes(unit: PriceUnit, dates: &[NaiveDate], closes: &[f64]) -> Result<Self> {
        if dates.len() != closes.len() {
            return Err(ForecastError::DataError(format!(
                "Dates length ({}) doesn't match closes length ({})",
                dates.len(),
                closes.len()
            )));
        }
        let bars = dates
            .iter()
            .zip(closes)
            .map(|(&d, &c)| PriceBar::flat(d, c))
            .collect();
        Self::new(unit, bars)
    }

    pub fn unit(&self) -> PriceUnit {
        self.unit
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Close on an exact date, if that bar exists.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.bars
            .binary_search_by_key(&date, |b| b.date)
            .ok()
            .map(|i| self.bars[i].close)
    }

    /// The bars dated on or before `date`.
    pub fn truncated_to(&self, date: NaiveDate) -> PriceSeries {
        let end = self.bars.partition_point(|b| b.date <= date);
        PriceSeries {
            unit: self.unit,
            bars: self.bars[..end].to_vec(),
        }
    }
}

/// Data loader for CSV price files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load a `date,open,high,low,close` CSV file.
    pub fn from_csv<P: AsRef<Path>>(path: P, unit: PriceUnit) -> Result<PriceSeries> {
        let file = File::open(path.as_ref())?;
        let series = Self::from_reader(file, unit)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            bars = series.len(),
            "Loaded price series"
        );
        Ok(series)
    }

    /// Read `date,open,high,low,close` rows from any reader.
    pub fn from_reader<R: Read>(reader: R, unit: PriceUnit) -> Result<PriceSeries> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let bars = rdr
            .deserialize::<PriceBar>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        PriceSeries::new(unit, bars)
    }
}

/// A data-quality condition met while pairing two series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityNote {
    pub pair: String,
    pub dropped_left: usize,
    pub dropped_right: usize,
    pub aligned: usize,
}

impl fmt::Display for DataQualityNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} aligned bars, dropped {} + {} unmatched dates",
            self.pair, self.aligned, self.dropped_left, self.dropped_right
        )
    }
}

/// Closes of two series restricted to their common dates.
///
/// The three columns always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCloses {
    dates: Vec<NaiveDate>,
    left: Vec<f64>,
    right: Vec<f64>,
    note: Option<DataQualityNote>,
}

impl AlignedCloses {
    /// Build from already-paired columns.
    pub fn new(dates: Vec<NaiveDate>, left: Vec<f64>, right: Vec<f64>) -> Result<Self> {
        if left.len() != dates.len() || right.len() != dates.len() {
            return Err(ForecastError::DataError(format!(
                "Aligned columns differ in length: {} dates, {} left, {} right",
                dates.len(),
                left.len(),
                right.len()
            )));
        }
        Ok(Self {
            dates,
            left,
            right,
            note: None,
        })
    }

    pub fn with_note(mut self, note: DataQualityNote) -> Self {
        self.note = Some(note);
        self
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn left(&self) -> &[f64] {
        &self.left
    }

    pub fn right(&self) -> &[f64] {
        &self.right
    }

    pub fn note(&self) -> Option<&DataQualityNote> {
        self.note.as_ref()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Inner join on dates. No interpolation: only shared dates are kept.
pub fn align_closes(left: &PriceSeries, right: &PriceSeries, pair: &str) -> AlignedCloses {
    let (a, b) = (left.bars(), right.bars());
    let mut dates = Vec::with_capacity(a.len().min(b.len()));
    let mut lc = Vec::with_capacity(dates.capacity());
    let mut rc = Vec::with_capacity(dates.capacity());

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dates.push(a[i].date);
                lc.push(a[i].close);
                rc.push(b[j].close);
                i += 1;
                j += 1;
            }
        }
    }

    let aligned = dates.len();
    let dropped_left = a.len() - aligned;
    let dropped_right = b.len() - aligned;
    let mut closes = AlignedCloses {
        dates,
        left: lc,
        right: rc,
        note: None,
    };
    if dropped_left + dropped_right > 0 {
        tracing::warn!(
            pair,
            aligned,
            dropped_left,
            dropped_right,
            "Dropped bars without a matching date"
        );
        closes = closes.with_note(DataQualityNote {
            pair: pair.to_string(),
            dropped_left,
            dropped_right,
            aligned,
        });
    }
    closes
}
