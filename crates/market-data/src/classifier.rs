//! Series alignment and hard/soft failure routing.
//!
//! Chart payloads carry two parallel arrays: timestamps and values. Position
//! `i` of one belongs to position `i` of the other. [`align_series`] zips
//! them and records every unusable position; [`FailureClassifier`] turns the
//! result into records plus diagnostic events.

use chrono::{DateTime, NaiveDate};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, Subject};
use crate::errors::{FailureTier, MarketDataError};

/// Why a single position was dropped.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PointDefect {
    /// Timestamp is null or out of range.
    MissingDate,
    /// Value is null.
    MissingValue,
    /// Value is present but not acceptable (NaN, infinite, out of range).
    InvalidValue,
}

impl PointDefect {
    fn describe(&self) -> &'static str {
        match self {
            Self::MissingDate => "missing date",
            Self::MissingValue => "missing value",
            Self::InvalidValue => "invalid value",
        }
    }
}

/// A usable position.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesPoint<V> {
    pub index: usize,
    pub date: NaiveDate,
    pub value: V,
}

/// A dropped position.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedPoint {
    pub index: usize,
    /// Date of the position, when the timestamp itself was usable
    pub date: Option<NaiveDate>,
    pub defect: PointDefect,
}

/// Result of zipping a timestamp array with a value array.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedSeries<V> {
    pub points: Vec<SeriesPoint<V>>,
    pub skipped: Vec<SkippedPoint>,
}

/// The two arrays cannot be paired.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LengthMismatch {
    pub timestamps: usize,
    pub values: usize,
}

/// Calendar date of a Unix timestamp shifted by `utc_offset_secs`.
pub fn timestamp_to_date(timestamp: i64, utc_offset_secs: i32) -> Option<NaiveDate> {
    let shifted = timestamp.checked_add(i64::from(utc_offset_secs))?;
    DateTime::from_timestamp(shifted, 0).map(|dt| dt.date_naive())
}

/// Strictly positive finite decimal.
pub fn positive_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Decimal::from_f64(value)
}

/// Non-negative finite decimal.
pub fn non_negative_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Decimal::from_f64(value)
}

/// Pair `timestamps[i]` with `values[i]`.
///
/// Arrays of different length cannot be aligned. Otherwise every position
/// ends up in exactly one of `points` or `skipped`, in index order.
pub fn align_series<V, F>(
    timestamps: &[Option<i64>],
    values: &[Option<f64>],
    utc_offset_secs: i32,
    convert: F,
) -> Result<AlignedSeries<V>, LengthMismatch>
where
    F: Fn(f64) -> Option<V>,
{
    if timestamps.len() != values.len() {
        return Err(LengthMismatch {
            timestamps: timestamps.len(),
            values: values.len(),
        });
    }

    let mut points = Vec::with_capacity(timestamps.len());
    let mut skipped = Vec::new();

    for (index, (timestamp, value)) in timestamps.iter().zip(values).enumerate() {
        let date = timestamp.and_then(|ts| timestamp_to_date(ts, utc_offset_secs));

        let defect = match (date, value) {
            (None, _) => Some(PointDefect::MissingDate),
            (Some(_), None) => Some(PointDefect::MissingValue),
            (Some(date), Some(raw)) => match convert(*raw) {
                Some(value) => {
                    points.push(SeriesPoint { index, date, value });
                    None
                }
                None => Some(PointDefect::InvalidValue),
            },
        };

        if let Some(defect) = defect {
            skipped.push(SkippedPoint {
                index,
                date,
                defect,
            });
        }
    }

    Ok(AlignedSeries { points, skipped })
}

/// Routes defects to the diagnostic sink according to their tier.
pub struct FailureClassifier<'a> {
    sink: &'a dyn DiagnosticSink,
}

impl<'a> FailureClassifier<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self { sink }
    }

    /// Report a hard failure and hand it back for returning to the caller.
    pub fn hard(
        &self,
        subject: &Subject,
        date: Option<NaiveDate>,
        error: MarketDataError,
    ) -> MarketDataError {
        debug_assert_eq!(error.tier(), FailureTier::Hard);
        self.sink.record(DiagnosticEvent::error(
            error.to_string(),
            subject.clone(),
            date,
        ));
        error
    }

    /// Report a soft failure; the caller keeps going.
    pub fn soft(&self, subject: &Subject, date: Option<NaiveDate>, message: impl Into<String>) {
        let error = MarketDataError::DataPoint {
            subject: subject.to_string(),
            message: message.into(),
        };
        self.sink.record(DiagnosticEvent::warning(
            error.to_string(),
            subject.clone(),
            date,
        ));
    }

    /// Keep the usable points and report one soft failure per skipped point.
    pub fn admit<V>(&self, subject: &Subject, series: AlignedSeries<V>) -> Vec<SeriesPoint<V>> {
        for skipped in &series.skipped {
            self.soft(
                subject,
                skipped.date,
                format!("{} at position {}", skipped.defect.describe(), skipped.index),
            );
        }
        series.points
    }
}
