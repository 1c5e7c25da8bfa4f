//! RideSync - cycling sensor recorder
//!
//! Connects to BLE power, heart rate and cadence sensors (or synthetic
//! stand-ins), validates and stores their samples, aligns the three streams
//! on a common one-second timeline, and exports workouts as TCX, CSV or JSON.

pub mod recording;
pub mod sensors;
pub mod storage;

// Re-export commonly used types
pub use recording::recorder::RideRecorder;
pub use recording::store::MeasurementStore;
pub use sensors::manager::SensorManager;
pub use sensors::types::Metric;
pub use storage::config::AppConfig;
