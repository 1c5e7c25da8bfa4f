//! Recording types for sample capture, timeline sync and export.

use crate::sensors::types::Metric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single accepted reading from one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock capture time, milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Reading in the metric's unit (W, BPM or RPM)
    pub value: f64,
}

impl Sample {
    /// Create a new sample.
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One point of the synchronized 1 Hz timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    /// Grid time, milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Heart rate nearest to the grid time, if within tolerance
    pub heartrate: Option<f64>,
    /// Cadence nearest to the grid time, if within tolerance
    pub cadence: Option<f64>,
    /// Power nearest to the grid time, if within tolerance
    pub power: Option<f64>,
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// TCX format (XML, Strava/Garmin compatible)
    Tcx,
    /// CSV format (spreadsheet compatible)
    Csv,
    /// Raw store dump as JSON
    Json,
}

impl ExportFormat {
    /// All formats written by a full export.
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Json, ExportFormat::Tcx, ExportFormat::Csv];

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Tcx => "tcx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Tcx => write!(f, "TCX"),
            ExportFormat::Csv => write!(f, "CSV"),
            ExportFormat::Json => write!(f, "JSON"),
        }
    }
}

/// A sample value outside its metric's open bound interval.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{metric} must be greater than {min}, got {value}")]
    BelowMinimum { metric: Metric, value: f64, min: f64 },

    #[error("{metric} must be less than {max}, got {value}")]
    AboveMaximum { metric: Metric, value: f64, max: f64 },
}

impl ValidationError {
    /// Metric of the rejected sample.
    pub fn metric(&self) -> Metric {
        match self {
            ValidationError::BelowMinimum { metric, .. }
            | ValidationError::AboveMaximum { metric, .. } => *metric,
        }
    }
}

/// Errors from the ride recorder.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// A stored sample failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Measurement store lock was poisoned by a panicking writer
    #[error("Measurement store is unavailable")]
    StoreUnavailable,

    /// Export failed
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Errors during ride export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Timestamp cannot be represented as a calendar date
    #[error("Timestamp out of range: {0}")]
    InvalidTimestamp(i64),

    /// XML generation error
    #[error("XML error: {0}")]
    XmlError(String),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Failed to write export data
    #[error("Failed to write data: {0}")]
    WriteFailed(String),

    /// A JSON document contained an invalid sample
    #[error("Invalid sample in import: {0}")]
    InvalidSample(#[from] ValidationError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Calendar time of a millisecond timestamp, if chrono can represent it.
pub fn utc_datetime(timestamp_ms: i64) -> Result<chrono::DateTime<chrono::Utc>, ExportError> {
    chrono::DateTime::<chrono::Utc>::from_timestamp_millis(timestamp_ms)
        .ok_or(ExportError::InvalidTimestamp(timestamp_ms))
}

/// Format a millisecond timestamp as ISO-8601 UTC with millisecond precision.
pub fn iso_timestamp(timestamp_ms: i64) -> Result<String, ExportError> {
    utc_datetime(timestamp_ms).map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}
