//! Sensor types and enums for the three BLE cycling sensors.
//!
//! Defines the metric kinds, connection state, sensor events and the
//! error types shared by decoders, transports and sessions.

use crate::recording::types::{Sample, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A measured quantity, one per physical sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Instantaneous power in watts
    Power,
    /// Heart rate in BPM
    #[serde(rename = "heartrate")]
    HeartRate,
    /// Crank cadence in RPM
    Cadence,
}

impl Metric {
    /// All metrics, in the order sensors are usually connected.
    pub const ALL: [Metric; 3] = [Metric::Power, Metric::HeartRate, Metric::Cadence];

    /// Open interval of plausible values: `(min, max)`, both exclusive.
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Metric::Power => (0.0, 3000.0),
            Metric::HeartRate => (0.0, 300.0),
            Metric::Cadence => (0.0, 300.0),
        }
    }

    /// Key used in exported documents and logs.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Power => "power",
            Metric::HeartRate => "heartrate",
            Metric::Cadence => "cadence",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Metric::Power => write!(f, "Power"),
            Metric::HeartRate => write!(f, "Heart Rate"),
            Metric::Cadence => write!(f, "Cadence"),
        }
    }
}

/// Connection state of a metric's sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not connected
    #[default]
    Disconnected,
    /// Discovery and handshake in progress
    Connecting,
    /// Notifications are being delivered
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting..."),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// Where sensor samples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorSource {
    /// Physical BLE sensors
    #[default]
    Bluetooth,
    /// Synthetic timer-driven sensors
    Mock,
}

/// Events from the sensor system.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    /// Connection state of a metric changed
    ConnectionChanged {
        metric: Metric,
        state: ConnectionState,
    },
    /// A sample was accepted into the store
    Sample { metric: Metric, sample: Sample },
    /// A sample was rejected by store validation
    Rejected(ValidationError),
    /// Error occurred
    Error(String),
}

/// Configuration for the sensor manager.
#[derive(Debug, Clone)]
pub struct SensorConfig {
    /// Source of samples for `SensorManager::connect`
    pub source: SensorSource,
    /// Timeout for device discovery and handshake in seconds
    pub discovery_timeout_secs: u64,
    /// Seed for mock value generation
    pub mock_seed: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            source: SensorSource::Bluetooth,
            discovery_timeout_secs: 30,
            mock_seed: 0x5eed,
        }
    }
}

/// Source of wall-clock capture timestamps.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Clock backed by the system's UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A notification frame shorter than its layout requires.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("{metric} frame truncated: needed {needed} bytes, got {actual}")]
    Truncated {
        metric: Metric,
        needed: usize,
        actual: usize,
    },
}

/// Errors that can occur in the sensor system.
#[derive(Debug, Error)]
pub enum SensorError {
    /// BLE adapter not found or unavailable
    #[error("Bluetooth adapter not found")]
    AdapterNotFound,

    /// No device advertising the required service was found
    #[error("No {0} sensor found")]
    SensorNotFound(Metric),

    /// Connection to sensor failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Discovery or handshake did not finish in time
    #[error("Connection timed out")]
    ConnectionTimeout,

    /// The measurement characteristic is missing on the device
    #[error("Characteristic not found: {0}")]
    CharacteristicNotFound(String),

    /// Failed to subscribe to sensor notifications
    #[error("Failed to subscribe to notifications: {0}")]
    SubscriptionFailed(String),

    /// Notifications were requested before a device was connected
    #[error("Transport is not connected")]
    NotConnected,

    /// A session for this metric is already live
    #[error("{0} sensor is already connected")]
    AlreadyConnected(Metric),

    /// Generic BLE error
    #[error("BLE error: {0}")]
    BleError(String),
}
