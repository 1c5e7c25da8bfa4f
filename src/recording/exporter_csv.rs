//! CSV export of the synchronized timeline.

use crate::recording::store::MeasurementStore;
use crate::recording::timeline::merge_measurements;
use crate::recording::types::{iso_timestamp, ExportError, TimelinePoint};
use std::io::Write;

/// Header row of every CSV export.
pub const CSV_HEADER: &str = "timestamp,power,cadence,heartrate";

/// Export the store's synchronized timeline as CSV.
///
/// An empty store produces an empty string.
pub fn export_csv(store: &MeasurementStore) -> Result<String, ExportError> {
    let points = merge_measurements(store);
    csv_from_points(&points)
}

/// Serialize timeline points as CSV rows, newline separated, no trailing newline.
pub fn csv_from_points(points: &[TimelinePoint]) -> Result<String, ExportError> {
    if points.is_empty() {
        return Ok(String::new());
    }

    let mut output = Vec::new();
    write!(output, "{}", CSV_HEADER).map_err(|e| ExportError::WriteFailed(e.to_string()))?;

    for point in points {
        write!(
            output,
            "\n{},{},{},{}",
            iso_timestamp(point.timestamp)?,
            field(point.power),
            field(point.cadence),
            field(point.heartrate),
        )
        .map_err(|e| ExportError::WriteFailed(e.to_string()))?;
    }

    String::from_utf8(output).map_err(|e| ExportError::WriteFailed(e.to_string()))
}

/// Rounded integer, or empty when absent.
fn field(value: Option<f64>) -> String {
    value.map_or(String::new(), |v| (v.round() as i64).to_string())
}
