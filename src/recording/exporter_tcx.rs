//! TCX export of the synchronized timeline.
//!
//! Writes a Garmin TrainingCenterDatabase v2 document with one lap and one
//! trackpoint per timeline point. Power goes into the ActivityExtension v2
//! `TPX` block.

use crate::recording::store::MeasurementStore;
use crate::recording::timeline::merge_measurements;
use crate::recording::types::{iso_timestamp, ExportError, TimelinePoint};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// TCX XML namespaces
const NS_TCX: &str = "http://www.garmin.com/xmlschemas/TrainingCenterDatabase/v2";
const NS_TPX: &str = "http://www.garmin.com/xmlschemas/ActivityExtension/v2";

/// Export the store's synchronized timeline as TCX.
///
/// An empty store produces an empty string.
pub fn export_tcx(store: &MeasurementStore) -> Result<String, ExportError> {
    let points = merge_measurements(store);
    tcx_from_points(&points)
}

/// Serialize timeline points as a TCX document.
pub fn tcx_from_points(points: &[TimelinePoint]) -> Result<String, ExportError> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Ok(String::new());
    };

    let start_time = iso_timestamp(first.timestamp)?;
    let total_time_seconds = ((last.timestamp - first.timestamp) as f64 / 1000.0).round() as i64;

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut root = BytesStart::new("TrainingCenterDatabase");
    root.push_attribute(("xmlns", NS_TCX));
    start(&mut writer, root)?;
    start(&mut writer, BytesStart::new("Activities"))?;

    let mut activity = BytesStart::new("Activity");
    activity.push_attribute(("Sport", "Biking"));
    start(&mut writer, activity)?;

    write_element(&mut writer, "Id", &start_time)?;

    let mut lap = BytesStart::new("Lap");
    lap.push_attribute(("StartTime", start_time.as_str()));
    start(&mut writer, lap)?;

    write_element(&mut writer, "TotalTimeSeconds", &total_time_seconds.to_string())?;
    write_element(&mut writer, "Calories", "0")?;
    write_element(&mut writer, "Intensity", "Active")?;
    write_element(&mut writer, "TriggerMethod", "Manual")?;

    start(&mut writer, BytesStart::new("Track"))?;
    for point in points {
        write_trackpoint(&mut writer, point)?;
    }
    end(&mut writer, "Track")?;

    end(&mut writer, "Lap")?;
    end(&mut writer, "Activity")?;
    end(&mut writer, "Activities")?;
    end(&mut writer, "TrainingCenterDatabase")?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(|e| ExportError::XmlError(e.to_string()))
}

/// Write a single trackpoint, skipping absent metrics.
fn write_trackpoint<W: std::io::Write>(
    writer: &mut Writer<W>,
    point: &TimelinePoint,
) -> Result<(), ExportError> {
    start(writer, BytesStart::new("Trackpoint"))?;

    write_element(writer, "Time", &iso_timestamp(point.timestamp)?)?;

    if let Some(hr) = point.heartrate {
        start(writer, BytesStart::new("HeartRateBpm"))?;
        write_element(writer, "Value", &round(hr))?;
        end(writer, "HeartRateBpm")?;
    }

    if let Some(cadence) = point.cadence {
        write_element(writer, "Cadence", &round(cadence))?;
    }

    if let Some(power) = point.power {
        start(writer, BytesStart::new("Extensions"))?;
        let mut tpx = BytesStart::new("TPX");
        tpx.push_attribute(("xmlns", NS_TPX));
        start(writer, tpx)?;
        write_element(writer, "Watts", &round(power))?;
        end(writer, "TPX")?;
        end(writer, "Extensions")?;
    }

    end(writer, "Trackpoint")
}

/// Write a simple element with text content.
fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<(), ExportError> {
    start(writer, BytesStart::new(name))?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_error)?;
    end(writer, name)
}

fn start<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: BytesStart<'_>,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(tag)).map_err(xml_error)
}

fn end<W: std::io::Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ExportError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn xml_error(e: quick_xml::Error) -> ExportError {
    ExportError::XmlError(e.to_string())
}

fn round(value: f64) -> String {
    (value.round() as i64).to_string()
}
