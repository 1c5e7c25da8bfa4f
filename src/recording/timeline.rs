//! Timeline synchronization.
//!
//! Aligns the independently sampled metric streams onto one 1 Hz grid by
//! nearest-neighbour lookup with a fixed tolerance.

use crate::recording::store::MeasurementStore;
use crate::recording::types::{Sample, TimelinePoint};
use crate::sensors::types::Metric;

/// Spacing of the synchronized grid in milliseconds.
pub const GRID_STEP_MS: i64 = 1000;

/// Maximum distance between a grid time and the sample used for it.
pub const SYNC_TOLERANCE_MS: i64 = 1000;

/// Longest grid built: one week of points.
pub const MAX_GRID_POINTS: usize = 7 * 24 * 60 * 60;

/// Look up the nearest sample value for each query time.
///
/// `stream` must be sorted by timestamp and `queries` strictly increasing.
/// A single forward cursor is shared across all queries, so the cost is
/// linear in `stream.len() + queries.len()`. When a query sits exactly
/// between two samples the earlier one wins. Values further than
/// [`SYNC_TOLERANCE_MS`] from the query yield `None`.
pub fn get_values_at_timestamps(stream: &[Sample], queries: &[i64]) -> Vec<Option<f64>> {
    let mut cursor = 0usize;

    queries
        .iter()
        .map(|&query| {
            while cursor < stream.len() && stream[cursor].timestamp < query {
                cursor += 1;
            }

            let prev = cursor.checked_sub(1).map(|i| &stream[i]);
            let next = stream.get(cursor);

            let candidate = match (prev, next) {
                (None, next) => next,
                (prev, None) => prev,
                (Some(prev), Some(next)) => {
                    if query.abs_diff(prev.timestamp) <= next.timestamp.abs_diff(query) {
                        Some(prev)
                    } else {
                        Some(next)
                    }
                }
            };

            candidate
                .filter(|sample| sample.timestamp.abs_diff(query) <= SYNC_TOLERANCE_MS as u64)
                .map(|sample| sample.value)
        })
        .collect()
}

/// Build the synchronized timeline from everything in the store.
///
/// The grid runs from the earliest first sample to the latest last sample,
/// inclusive, in [`GRID_STEP_MS`] steps, and stops after
/// [`MAX_GRID_POINTS`]. An empty store gives an empty timeline.
pub fn merge_measurements(store: &MeasurementStore) -> Vec<TimelinePoint> {
    let streams = Metric::ALL.map(|metric| store.samples(metric));

    let start_time = streams
        .iter()
        .filter_map(|stream| stream.first())
        .map(|sample| sample.timestamp)
        .min();
    let end_time = streams
        .iter()
        .filter_map(|stream| stream.last())
        .map(|sample| sample.timestamp)
        .max();

    let (Some(start_time), Some(end_time)) = (start_time, end_time) else {
        return Vec::new();
    };

    let grid = build_grid(start_time, end_time);

    let heartrate = get_values_at_timestamps(store.heart_rate(), &grid);
    let cadence = get_values_at_timestamps(store.cadence(), &grid);
    let power = get_values_at_timestamps(store.power(), &grid);

    grid.iter()
        .enumerate()
        .map(|(i, &timestamp)| TimelinePoint {
            timestamp,
            heartrate: heartrate[i],
            cadence: cadence[i],
            power: power[i],
        })
        .collect()
}

/// Grid times from `start` to `end` inclusive, at most [`MAX_GRID_POINTS`].
fn build_grid(start: i64, end: i64) -> Vec<i64> {
    let steps = end.saturating_sub(start).max(0) / GRID_STEP_MS;
    let len = usize::try_from(steps).unwrap_or(usize::MAX).saturating_add(1);

    if len > MAX_GRID_POINTS {
        tracing::warn!(
            "Timeline would need {} points, keeping the first {}",
            len,
            MAX_GRID_POINTS
        );
    }

    (0..len.min(MAX_GRID_POINTS) as i64)
        .map_while(|i| start.checked_add(i * GRID_STEP_MS))
        .collect()
}
