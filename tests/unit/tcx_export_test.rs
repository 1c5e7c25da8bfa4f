//! Unit tests for TCX export.

use ridesync::recording::exporter_tcx::{export_tcx, tcx_from_points};
use ridesync::recording::store::MeasurementStore;
use ridesync::recording::types::{Sample, TimelinePoint};
use ridesync::sensors::types::Metric;

/// 2025-01-15T10:00:00.000Z
const START: i64 = 1_736_935_200_000;

fn point(
    offset_secs: i64,
    hr: Option<f64>,
    cadence: Option<f64>,
    power: Option<f64>,
) -> TimelinePoint {
    TimelinePoint {
        timestamp: START + offset_secs * 1000,
        heartrate: hr,
        cadence,
        power,
    }
}

#[test]
fn test_empty_input_produces_no_document() {
    assert_eq!(tcx_from_points(&[]).unwrap(), "");
    assert_eq!(export_tcx(&MeasurementStore::new()).unwrap(), "");
}

#[test]
fn test_document_structure() {
    let points = vec![
        point(0, Some(140.0), Some(85.0), Some(200.0)),
        point(1, Some(141.0), Some(86.0), Some(205.0)),
    ];
    let tcx = tcx_from_points(&points).unwrap();

    assert!(tcx.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(tcx.contains(
        "<TrainingCenterDatabase xmlns=\"http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2\">"
    ));
    assert!(tcx.contains("<Activity Sport=\"Biking\">"));
    assert!(tcx.contains("<Id>2025-01-15T10:00:00.000Z</Id>"));
    assert!(tcx.contains("<Lap StartTime=\"2025-01-15T10:00:00.000Z\">"));
    assert!(tcx.contains("<TotalTimeSeconds>1</TotalTimeSeconds>"));
    assert_eq!(tcx.matches("<Trackpoint>").count(), 2);
    assert!(tcx.trim_end().ends_with("</TrainingCenterDatabase>"));
}

#[test]
fn test_trackpoint_metrics() {
    let tcx = tcx_from_points(&[point(0, Some(139.6), Some(84.4), Some(250.5))]).unwrap();

    assert!(tcx.contains("<Time>2025-01-15T10:00:00.000Z</Time>"));
    assert!(tcx.contains("<Value>140</Value>"));
    assert!(tcx.contains("<Cadence>84</Cadence>"));
    assert!(tcx.contains("<TPX xmlns=\"http://www.garmin.com/xmlschemas/ActivityExtension/v2\">"));
    assert!(tcx.contains("<Watts>251</Watts>"));
}

#[test]
fn test_missing_metrics_are_omitted() {
    let tcx = tcx_from_points(&[point(0, Some(150.0), None, None)]).unwrap();

    assert!(tcx.contains("<HeartRateBpm>"));
    assert!(!tcx.contains("<Cadence>"));
    assert!(!tcx.contains("<Extensions>"));
    assert!(!tcx.contains("<Watts>"));
}

#[test]
fn test_total_time_is_rounded_span() {
    let points = vec![
        TimelinePoint {
            timestamp: START,
            heartrate: Some(120.0),
            cadence: None,
            power: None,
        },
        TimelinePoint {
            timestamp: START + 3_600_000,
            heartrate: Some(130.0),
            cadence: None,
            power: None,
        },
    ];
    let tcx = tcx_from_points(&points).unwrap();
    assert!(tcx.contains("<TotalTimeSeconds>3600</TotalTimeSeconds>"));
}

#[test]
fn test_export_from_store() {
    let mut store = MeasurementStore::new();
    for i in 0..5 {
        store.add(Metric::Power, Sample::new(START + i * 1000, 200.0)).unwrap();
    }

    let tcx = export_tcx(&store).unwrap();
    assert_eq!(tcx.matches("<Trackpoint>").count(), 5);
    assert_eq!(tcx.matches("<Watts>200</Watts>").count(), 5);
    assert!(tcx.contains("<TotalTimeSeconds>4</TotalTimeSeconds>"));
}
