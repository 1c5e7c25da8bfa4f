//! Sensor module for BLE device communication and frame decoding.

pub mod decoder;
pub mod manager;
pub mod mock;
pub mod session;
pub mod ticker;
pub mod transport;
pub mod types;

pub use decoder::{decoder_for, CadenceDecoder, RolloverState, SensorDecoder};
pub use manager::SensorManager;
pub use session::ConnectionSession;
pub use transport::{BleTransport, NotificationStream, Transport};
pub use types::{
    Clock, ConnectionState, FrameError, Metric, SensorConfig, SensorError, SensorEvent,
    SensorSource, SystemClock,
};
