//! Unit tests for CSV export.

use ridesync::recording::exporter_csv::{csv_from_points, export_csv, CSV_HEADER};
use ridesync::recording::store::MeasurementStore;
use ridesync::recording::types::{Sample, TimelinePoint};
use ridesync::sensors::types::Metric;

#[test]
fn test_empty_input_produces_empty_string() {
    assert_eq!(csv_from_points(&[]).unwrap(), "");
    assert_eq!(export_csv(&MeasurementStore::new()).unwrap(), "");
}

#[test]
fn test_header_and_column_order() {
    let points = [TimelinePoint {
        timestamp: 1000,
        heartrate: Some(140.0),
        cadence: Some(80.0),
        power: Some(250.0),
    }];
    let csv = csv_from_points(&points).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], "1970-01-01T00:00:01.000Z,250,80,140");
}

#[test]
fn test_nulls_become_empty_fields() {
    let points = [
        TimelinePoint {
            timestamp: 0,
            heartrate: None,
            cadence: None,
            power: Some(199.5),
        },
        TimelinePoint {
            timestamp: 1000,
            heartrate: Some(150.4),
            cadence: None,
            power: None,
        },
    ];
    let csv = csv_from_points(&points).unwrap();

    assert_eq!(
        csv,
        "timestamp,power,cadence,heartrate\n\
         1970-01-01T00:00:00.000Z,200,,\n\
         1970-01-01T00:00:01.000Z,,,150"
    );
}

#[test]
fn test_export_from_store_has_row_per_second() {
    let mut store = MeasurementStore::new();
    store.add(Metric::HeartRate, Sample::new(1000, 140.0)).unwrap();
    store.add(Metric::HeartRate, Sample::new(4000, 150.0)).unwrap();

    let csv = export_csv(&store).unwrap();
    assert_eq!(csv.lines().count(), 5);
    assert!(csv.ends_with(",,150"));
}
