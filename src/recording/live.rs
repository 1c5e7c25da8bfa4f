//! Live metric readout.
//!
//! A display shows the most recent stored value for a metric only while the
//! sensor is connected and the value is fresh. This staleness rule is
//! independent from the timeline synchronizer's tolerance.

use crate::recording::store::MeasurementStore;
use crate::sensors::types::Metric;

/// Default maximum age of a displayed value.
pub const DEFAULT_STALENESS_MS: i64 = 5000;

/// Placeholder shown when no fresh value is available.
pub const EMPTY_READOUT: &str = "--";

/// Current value of one metric for display, if any.
pub fn live_value(
    store: &MeasurementStore,
    metric: Metric,
    connected: bool,
    now: i64,
    staleness_ms: i64,
) -> Option<f64> {
    if !connected {
        return None;
    }
    store
        .latest(metric)
        .filter(|sample| now - sample.timestamp <= staleness_ms)
        .map(|sample| sample.value)
}

/// Snapshot of all three readouts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiveReadout {
    pub power: Option<f64>,
    pub heartrate: Option<f64>,
    pub cadence: Option<f64>,
}

impl LiveReadout {
    /// Read every metric; `connected` reports each metric's connection state.
    pub fn read(
        store: &MeasurementStore,
        connected: impl Fn(Metric) -> bool,
        now: i64,
        staleness_ms: i64,
    ) -> Self {
        let value = |metric| live_value(store, metric, connected(metric), now, staleness_ms);
        Self {
            power: value(Metric::Power),
            heartrate: value(Metric::HeartRate),
            cadence: value(Metric::Cadence),
        }
    }
}

impl std::fmt::Display for LiveReadout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "power {} W | heart rate {} bpm | cadence {} rpm",
            format_readout(self.power),
            format_readout(self.heartrate),
            format_readout(self.cadence)
        )
    }
}

/// Display text for a readout value.
pub fn format_readout(value: Option<f64>) -> String {
    value.map_or_else(|| EMPTY_READOUT.to_string(), |v| format!("{}", v.round() as i64))
}
