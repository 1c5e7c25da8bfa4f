//! Unit tests for measurement store validation.

use ridesync::recording::store::MeasurementStore;
use ridesync::recording::types::{Sample, ValidationError};
use ridesync::sensors::types::Metric;

#[test]
fn test_values_inside_bounds_are_accepted() {
    let mut store = MeasurementStore::new();

    for metric in Metric::ALL {
        let (min, max) = metric.bounds();
        for value in [min + 0.001, (min + max) / 2.0, max - 0.001] {
            store.add(metric, Sample::new(0, value)).unwrap();
        }
        assert_eq!(store.samples(metric).len(), 3);
    }
}

#[test]
fn test_boundaries_and_outside_values_are_rejected() {
    let mut store = MeasurementStore::new();

    for metric in Metric::ALL {
        let (min, max) = metric.bounds();
        for value in [min, max, min - 1.0, max + 1.0, f64::NAN] {
            let result = store.add(metric, Sample::new(0, value));
            assert!(result.is_err(), "{} accepted {}", metric, value);
            assert_eq!(result.unwrap_err().metric(), metric);
        }
        assert!(store.samples(metric).is_empty());
    }
    assert!(store.is_empty());
}

#[test]
fn test_error_names_violated_bound() {
    let mut store = MeasurementStore::new();

    assert_eq!(
        store.add(Metric::Power, Sample::new(0, 3000.0)),
        Err(ValidationError::AboveMaximum {
            metric: Metric::Power,
            value: 3000.0,
            max: 3000.0
        })
    );
    assert_eq!(
        store.add(Metric::HeartRate, Sample::new(0, 0.0)),
        Err(ValidationError::BelowMinimum {
            metric: Metric::HeartRate,
            value: 0.0,
            min: 0.0
        })
    );
}

#[test]
fn test_insertion_order_is_preserved() {
    let mut store = MeasurementStore::new();
    store.add(Metric::Cadence, Sample::new(3000, 90.0)).unwrap();
    store.add(Metric::Cadence, Sample::new(1000, 85.0)).unwrap();

    let timestamps: Vec<i64> = store.cadence().iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![3000, 1000]);
    assert_eq!(store.latest(Metric::Cadence), Some(&Sample::new(1000, 85.0)));
}

#[test]
fn test_reset_clears_every_metric() {
    let mut store = MeasurementStore::new();
    for metric in Metric::ALL {
        store.add(metric, Sample::new(1000, 100.0)).unwrap();
    }
    assert_eq!(store.len(), 3);

    store.reset();

    assert!(store.is_empty());
    for metric in Metric::ALL {
        assert!(store.latest(metric).is_none());
    }
}
