//! Recording module for sample storage, timeline sync and export.

pub mod exporter_csv;
pub mod exporter_json;
pub mod exporter_tcx;
pub mod live;
pub mod recorder;
pub mod store;
pub mod timeline;
pub mod timer;
pub mod types;

pub use recorder::RideRecorder;
pub use store::{MeasurementStore, SharedStore};
pub use timeline::{get_values_at_timestamps, merge_measurements};
pub use timer::WorkoutTimer;
pub use types::{
    ExportError, ExportFormat, RecorderError, Sample, TimelinePoint, ValidationError,
};
