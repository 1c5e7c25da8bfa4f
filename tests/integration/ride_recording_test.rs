//! Integration tests for ride recording and export.

use chrono::{TimeZone, Utc};
use ridesync::recording::exporter_json::import_json;
use ridesync::recording::recorder::RideRecorder;
use ridesync::recording::types::{ExportFormat, Sample};
use ridesync::sensors::types::Metric;
use tempfile::TempDir;

/// 2025-01-15T10:00:00.000Z
const START: i64 = 1_736_935_200_000;

fn record_minute(recorder: &RideRecorder) {
    let store = recorder.store();
    let mut store = store.lock().unwrap();
    for i in 0..60 {
        let t = START + i * 1000;
        store
            .add(Metric::Power, Sample::new(t + 100, 200.0 + (i % 50) as f64))
            .unwrap();
        store
            .add(Metric::HeartRate, Sample::new(t + 400, 140.0 + (i % 20) as f64))
            .unwrap();
        store
            .add(Metric::Cadence, Sample::new(t + 700, 80.0 + (i % 20) as f64))
            .unwrap();
    }
}

#[test]
fn test_full_recording_flow() {
    let mut recorder = RideRecorder::new();
    recorder.sensor_connected(START);
    record_minute(&recorder);
    recorder.timer_mut().stop(START + 60_000);

    assert_eq!(recorder.timer().elapsed_ms(START + 90_000), 60_000);

    let csv = recorder.export(ExportFormat::Csv).unwrap();
    // Header plus one row per second from the first to the last sample
    assert_eq!(csv.lines().count(), 61);
    assert!(csv.lines().skip(1).all(|row| !row.contains(",,")));

    let tcx = recorder.export(ExportFormat::Tcx).unwrap();
    assert_eq!(tcx.matches("<Trackpoint>").count(), 60);
    assert!(tcx.contains("<Lap StartTime=\"2025-01-15T10:00:00.100Z\">"));
}

#[test]
fn test_export_to_dir_writes_all_formats() {
    let dir = TempDir::new().unwrap();
    let recorder = RideRecorder::new();
    record_minute(&recorder);

    let now = Utc.with_ymd_and_hms(2025, 1, 15, 11, 5, 9).unwrap();
    let written = recorder.export_to_dir(dir.path(), &now).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec![
            "bike-measurements-2025-01-15-11-05-09.json",
            "bike-workout-2025-01-15-11-05-09.tcx",
            "bike-workout-2025-01-15-11-05-09.csv",
        ]
    );

    let json = std::fs::read_to_string(&written[0]).unwrap();
    let restored = import_json(&json).unwrap();
    assert_eq!(restored, recorder.snapshot().unwrap());
}

#[test]
fn test_discard_clears_recording() {
    let mut recorder = RideRecorder::new();
    recorder.timer_mut().start(START);
    record_minute(&recorder);

    recorder.discard().unwrap();

    assert!(recorder.snapshot().unwrap().is_empty());
    assert!(!recorder.timer().is_running());
    assert_eq!(recorder.export(ExportFormat::Tcx).unwrap(), "");
    assert_eq!(recorder.export(ExportFormat::Csv).unwrap(), "");
}
