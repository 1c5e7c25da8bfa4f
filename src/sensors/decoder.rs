//! BLE notification decoding for the power, heart rate and cadence sensors.
//!
//! Each decoder turns one raw notification frame plus its wall-clock
//! capture time into at most one sample. Only the cadence decoder keeps
//! state: crank revolutions arrive as wrapping 16-bit counters, so RPM is
//! derived from the delta between consecutive frames.

use crate::recording::types::Sample;
use crate::sensors::types::{FrameError, Metric};
use uuid::Uuid;

/// Cycling Power Service UUID (0x1818)
pub const CYCLING_POWER_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_1818_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Power Measurement UUID (0x2A63)
pub const CYCLING_POWER_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a63_0000_1000_8000_0080_5f9b_34fb);

/// Heart Rate Service UUID (0x180D)
pub const HEART_RATE_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_180d_0000_1000_8000_0080_5f9b_34fb);

/// Heart Rate Measurement UUID (0x2A37)
pub const HEART_RATE_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a37_0000_1000_8000_0080_5f9b_34fb);

/// Cycling Speed and Cadence Service UUID (0x1816)
pub const CSC_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_1816_0000_1000_8000_0080_5f9b_34fb);

/// CSC Measurement UUID (0x2A5B)
pub const CSC_MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x0000_2a5b_0000_1000_8000_0080_5f9b_34fb);

/// CSC flag: wheel revolution data present (bit 0)
const CSC_WHEEL_DATA_PRESENT: u8 = 0x01;

/// CSC flag: crank revolution data present (bit 1)
const CSC_CRANK_DATA_PRESENT: u8 = 0x02;

/// Crank event time resolution (ticks per second)
const CRANK_TIME_TICKS_PER_SECOND: f64 = 1024.0;

/// Upper bound (exclusive) of a plausible computed cadence
const MAX_PLAUSIBLE_RPM: f64 = 300.0;

/// Service and measurement characteristic for a metric's sensor.
pub fn gatt_uuids(metric: Metric) -> (Uuid, Uuid) {
    match metric {
        Metric::Power => (CYCLING_POWER_SERVICE_UUID, CYCLING_POWER_MEASUREMENT_UUID),
        Metric::HeartRate => (HEART_RATE_SERVICE_UUID, HEART_RATE_MEASUREMENT_UUID),
        Metric::Cadence => (CSC_SERVICE_UUID, CSC_MEASUREMENT_UUID),
    }
}

/// Decodes notification frames of one sensor type.
pub trait SensorDecoder: Send {
    /// Metric produced by this decoder.
    fn metric(&self) -> Metric;

    /// Decode one frame captured at `captured_at` (ms since epoch).
    ///
    /// `Ok(None)` means the frame was valid but yields no sample.
    fn decode(&mut self, frame: &[u8], captured_at: i64) -> Result<Option<Sample>, FrameError>;
}

/// Create a fresh decoder for a metric.
pub fn decoder_for(metric: Metric) -> Box<dyn SensorDecoder> {
    match metric {
        Metric::Power => Box::new(PowerDecoder),
        Metric::HeartRate => Box::new(HeartRateDecoder),
        Metric::Cadence => Box::new(CadenceDecoder::new()),
    }
}

fn require_len(metric: Metric, frame: &[u8], needed: usize) -> Result<(), FrameError> {
    if frame.len() < needed {
        return Err(FrameError::Truncated {
            metric,
            needed,
            actual: frame.len(),
        });
    }
    Ok(())
}

fn read_u16_le(frame: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([frame[offset], frame[offset + 1]])
}

/// Cycling Power Measurement decoder.
///
/// Bytes 0-1 are flags (ignored), bytes 2-3 the instantaneous power in
/// watts as little-endian u16.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerDecoder;

impl SensorDecoder for PowerDecoder {
    fn metric(&self) -> Metric {
        Metric::Power
    }

    fn decode(&mut self, frame: &[u8], captured_at: i64) -> Result<Option<Sample>, FrameError> {
        require_len(Metric::Power, frame, 4)?;
        let power = read_u16_le(frame, 2);
        Ok(Some(Sample::new(captured_at, f64::from(power))))
    }
}

/// Heart Rate Measurement decoder.
///
/// Byte 0 is flags (ignored), byte 1 the heart rate in BPM.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeartRateDecoder;

impl SensorDecoder for HeartRateDecoder {
    fn metric(&self) -> Metric {
        Metric::HeartRate
    }

    fn decode(&mut self, frame: &[u8], captured_at: i64) -> Result<Option<Sample>, FrameError> {
        require_len(Metric::HeartRate, frame, 2)?;
        Ok(Some(Sample::new(captured_at, f64::from(frame[1]))))
    }
}

/// Last crank reading seen by a cadence decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RolloverState {
    /// Cumulative crank revolutions of the previous frame
    pub last_rev_count: Option<u16>,
    /// Last crank event time of the previous frame (1/1024 s)
    pub last_event_time: Option<u16>,
}

impl RolloverState {
    /// State with no baseline reading.
    pub fn new() -> Self {
        Self::default()
    }

    /// State seeded with a previous reading.
    pub fn with_baseline(rev_count: u16, event_time: u16) -> Self {
        Self {
            last_rev_count: Some(rev_count),
            last_event_time: Some(event_time),
        }
    }
}

/// CSC Measurement decoder computing RPM from crank revolution deltas.
#[derive(Debug, Clone, Default)]
pub struct CadenceDecoder {
    state: RolloverState,
}

impl CadenceDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder continuing from a known previous reading.
    pub fn with_state(state: RolloverState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> RolloverState {
        self.state
    }

    /// Cadence between two crank readings, before plausibility filtering.
    ///
    /// Both counters wrap at 65536; deltas are taken modulo 2^16. Returns
    /// `None` when no crank time elapsed.
    pub fn compute_rpm(
        last_revs: u16,
        last_time: u16,
        crank_revs: u16,
        crank_time: u16,
    ) -> Option<f64> {
        let rev_delta = crank_revs.wrapping_sub(last_revs);
        let time_delta = crank_time.wrapping_sub(last_time);

        if time_delta == 0 {
            return None;
        }

        let seconds = f64::from(time_delta) / CRANK_TIME_TICKS_PER_SECOND;
        Some((f64::from(rev_delta) / seconds * 60.0).round())
    }
}

impl SensorDecoder for CadenceDecoder {
    fn metric(&self) -> Metric {
        Metric::Cadence
    }

    fn decode(&mut self, frame: &[u8], captured_at: i64) -> Result<Option<Sample>, FrameError> {
        require_len(Metric::Cadence, frame, 1)?;
        let flags = frame[0];

        if flags & CSC_CRANK_DATA_PRESENT == 0 {
            return Ok(None);
        }

        let offset = if flags & CSC_WHEEL_DATA_PRESENT != 0 {
            5
        } else {
            1
        };
        require_len(Metric::Cadence, frame, offset + 4)?;

        let crank_revs = read_u16_le(frame, offset);
        let crank_time = read_u16_le(frame, offset + 2);

        let sample = match (self.state.last_rev_count, self.state.last_event_time) {
            (Some(last_revs), Some(last_time)) => {
                Self::compute_rpm(last_revs, last_time, crank_revs, crank_time)
                    .filter(|&rpm| {
                        let plausible = rpm > 0.0 && rpm < MAX_PLAUSIBLE_RPM;
                        if !plausible {
                            tracing::debug!("Dropping implausible cadence of {} rpm", rpm);
                        }
                        plausible
                    })
                    .map(|rpm| Sample::new(captured_at, rpm))
            }
            _ => None,
        };

        self.state = RolloverState::with_baseline(crank_revs, crank_time);
        Ok(sample)
    }
}
