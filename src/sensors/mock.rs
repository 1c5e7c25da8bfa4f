//! Synthetic sensors for use without BLE hardware.
//!
//! Each metric emits uniformly distributed values on a fixed period,
//! matching the rate of the real sensor type.

use crate::recording::types::Sample;
use crate::sensors::types::Metric;
use std::time::Duration;

/// Emission period of a mock sensor.
pub fn mock_period(metric: Metric) -> Duration {
    match metric {
        Metric::Power => Duration::from_millis(100),
        Metric::HeartRate => Duration::from_millis(1000),
        Metric::Cadence => Duration::from_millis(1000),
    }
}

/// Half-open value range `[low, high)` of a mock sensor.
pub fn mock_range(metric: Metric) -> (u32, u32) {
    match metric {
        Metric::Power => (100, 400),
        Metric::HeartRate => (120, 200),
        Metric::Cadence => (70, 110),
    }
}

/// Seeded generator of plausible sensor values.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    metric: Metric,
    state: u64,
}

impl MockGenerator {
    pub fn new(metric: Metric, seed: u64) -> Self {
        Self {
            metric,
            state: seed,
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Next whole-number value in the metric's mock range.
    pub fn next_value(&mut self) -> f64 {
        let (low, high) = mock_range(self.metric);
        // 64-bit LCG; the high bits are the well-mixed ones.
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let span = u64::from(high - low);
        f64::from(low) + ((self.state >> 33) % span) as f64
    }

    /// Next sample stamped with `now`.
    pub fn next_sample(&mut self, now: i64) -> Sample {
        Sample::new(now, self.next_value())
    }
}
