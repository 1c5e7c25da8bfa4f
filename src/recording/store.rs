//! Append-only measurement store.
//!
//! Holds one insertion-ordered sequence of validated samples per metric.
//! The serialized shape, `{power, heartrate, cadence}`, is also the JSON
//! export format.

use crate::recording::types::{Sample, ValidationError};
use crate::sensors::types::Metric;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Store shared between sensor callbacks and readers.
///
/// Writers hold the lock for a single `add`; exporters clone a snapshot
/// under the lock and release it before serializing.
pub type SharedStore = Arc<Mutex<MeasurementStore>>;

/// Per-metric sequences of accepted samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementStore {
    power: Vec<Sample>,
    heartrate: Vec<Sample>,
    cadence: Vec<Sample>,
}

impl MeasurementStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store wrapped for sharing.
    pub fn shared() -> SharedStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Check a value against the metric's open bound interval.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(metric: Metric, value: f64) -> Result<(), ValidationError> {
        let (min, max) = metric.bounds();
        // Written as negated comparisons so NaN is rejected.
        if !(value > min) {
            return Err(ValidationError::BelowMinimum { metric, value, min });
        }
        if !(value < max) {
            return Err(ValidationError::AboveMaximum { metric, value, max });
        }
        Ok(())
    }

    /// Validate and append a sample. The store is unchanged on error.
    pub fn add(&mut self, metric: Metric, sample: Sample) -> Result<(), ValidationError> {
        Self::validate(metric, sample.value)?;
        self.sequence_mut(metric).push(sample);
        Ok(())
    }

    /// Clear all three sequences.
    pub fn reset(&mut self) {
        self.power.clear();
        self.heartrate.clear();
        self.cadence.clear();
    }

    /// Samples of one metric in arrival order.
    pub fn samples(&self, metric: Metric) -> &[Sample] {
        match metric {
            Metric::Power => &self.power,
            Metric::HeartRate => &self.heartrate,
            Metric::Cadence => &self.cadence,
        }
    }

    pub fn power(&self) -> &[Sample] {
        &self.power
    }

    pub fn heart_rate(&self) -> &[Sample] {
        &self.heartrate
    }

    pub fn cadence(&self) -> &[Sample] {
        &self.cadence
    }

    /// Most recent sample of a metric.
    pub fn latest(&self, metric: Metric) -> Option<&Sample> {
        self.samples(metric).last()
    }

    /// Total number of stored samples across all metrics.
    pub fn len(&self) -> usize {
        self.power.len() + self.heartrate.len() + self.cadence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sequence_mut(&mut self, metric: Metric) -> &mut Vec<Sample> {
        match metric {
            Metric::Power => &mut self.power,
            Metric::HeartRate => &mut self.heartrate,
            Metric::Cadence => &mut self.cadence,
        }
    }
}
