//! Ride recorder tying the workout timer to the measurement store.
//!
//! Owns the shared store that sensor sessions write into, and produces
//! exports from a snapshot taken under the store lock.

use crate::recording::exporter_csv::export_csv;
use crate::recording::exporter_json::export_json;
use crate::recording::exporter_tcx::export_tcx;
use crate::recording::store::{MeasurementStore, SharedStore};
use crate::recording::timer::WorkoutTimer;
use crate::recording::types::{ExportError, ExportFormat, RecorderError};
use chrono::{DateTime, TimeZone};
use std::path::{Path, PathBuf};

/// Records a workout: timer state plus every accepted sample.
pub struct RideRecorder {
    /// Store fed by sensor sessions
    store: SharedStore,
    /// Workout stopwatch
    timer: WorkoutTimer,
}

impl RideRecorder {
    /// Create a recorder with a fresh store.
    pub fn new() -> Self {
        Self::with_store(MeasurementStore::shared())
    }

    /// Create a recorder around an existing shared store.
    pub fn with_store(store: SharedStore) -> Self {
        Self {
            store,
            timer: WorkoutTimer::new(),
        }
    }

    /// Handle to the store, for wiring sensor sessions.
    pub fn store(&self) -> SharedStore {
        self.store.clone()
    }

    pub fn timer(&self) -> &WorkoutTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut WorkoutTimer {
        &mut self.timer
    }

    /// Note that a sensor connected at `now`.
    ///
    /// The first connection of a workout starts a fresh timer; later ones
    /// leave a running timer alone.
    pub fn sensor_connected(&mut self, now: i64) {
        if self.timer.is_running() {
            return;
        }
        self.timer.reset();
        self.timer.start(now);
        tracing::info!("Workout timer started");
    }

    /// Copy of the store taken under its lock.
    pub fn snapshot(&self) -> Result<MeasurementStore, RecorderError> {
        self.store
            .lock()
            .map(|store| store.clone())
            .map_err(|_| RecorderError::StoreUnavailable)
    }

    /// Throw the workout away: stop the timer and clear every sample.
    pub fn discard(&mut self) -> Result<(), RecorderError> {
        self.timer.reset();
        self.store
            .lock()
            .map_err(|_| RecorderError::StoreUnavailable)?
            .reset();
        tracing::info!("Discarded workout");
        Ok(())
    }

    /// Serialize the recording in one format.
    pub fn export(&self, format: ExportFormat) -> Result<String, RecorderError> {
        let snapshot = self.snapshot()?;
        Ok(render(&snapshot, format)?)
    }

    /// Write JSON, TCX and CSV exports into `dir`, returning the written paths.
    ///
    /// All three are rendered from the same snapshot.
    pub fn export_to_dir<Tz: TimeZone>(
        &self,
        dir: &Path,
        now: &DateTime<Tz>,
    ) -> Result<Vec<PathBuf>, RecorderError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let snapshot = self.snapshot()?;
        std::fs::create_dir_all(dir).map_err(ExportError::from)?;

        let mut written = Vec::new();
        for format in ExportFormat::ALL {
            let content = render(&snapshot, format)?;
            let path = dir.join(generate_filename(format, now));
            std::fs::write(&path, content).map_err(ExportError::from)?;
            tracing::info!("Exported {} to {}", format, path.display());
            written.push(path);
        }

        Ok(written)
    }
}

impl Default for RideRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn render(snapshot: &MeasurementStore, format: ExportFormat) -> Result<String, ExportError> {
    match format {
        ExportFormat::Tcx => export_tcx(snapshot),
        ExportFormat::Csv => export_csv(snapshot),
        ExportFormat::Json => export_json(snapshot),
    }
}

/// Default filename for an export made at `now`.
pub fn generate_filename<Tz: TimeZone>(format: ExportFormat, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let timestamp = now.format("%Y-%m-%d-%H-%M-%S");
    match format {
        ExportFormat::Json => format!("bike-measurements-{}.json", timestamp),
        ExportFormat::Tcx | ExportFormat::Csv => {
            format!("bike-workout-{}.{}", timestamp, format.extension())
        }
    }
}
