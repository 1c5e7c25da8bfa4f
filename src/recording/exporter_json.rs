//! JSON export and import of the raw measurement store.
//!
//! The document shape is `{power: [...], heartrate: [...], cadence: [...]}`
//! with `{timestamp, value}` entries, exactly the store's own layout.

use crate::recording::store::MeasurementStore;
use crate::recording::types::{utc_datetime, ExportError, Sample};
use crate::sensors::types::Metric;
use serde::Deserialize;

/// Serialize every stored sample as pretty-printed JSON.
pub fn export_json(store: &MeasurementStore) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(store)?)
}

#[derive(Deserialize)]
struct RawMeasurements {
    #[serde(default)]
    power: Vec<Sample>,
    #[serde(default)]
    heartrate: Vec<Sample>,
    #[serde(default)]
    cadence: Vec<Sample>,
}

/// Rebuild a store from an exported JSON document.
///
/// Every sample passes through [`MeasurementStore::add`], so an import can
/// never hold values a live recording would have rejected. Timestamps must
/// also be representable as calendar dates, as every export needs them.
pub fn import_json(json: &str) -> Result<MeasurementStore, ExportError> {
    let raw: RawMeasurements = serde_json::from_str(json)?;
    let mut store = MeasurementStore::new();

    for (metric, samples) in [
        (Metric::Power, raw.power),
        (Metric::HeartRate, raw.heartrate),
        (Metric::Cadence, raw.cadence),
    ] {
        for sample in samples {
            utc_datetime(sample.timestamp)?;
            store.add(metric, sample)?;
        }
    }

    Ok(store)
}
