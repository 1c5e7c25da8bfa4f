//! In-memory transport replaying recorded notification frames.

use futures::future::{BoxFuture, FutureExt};
use futures::stream::StreamExt;
use ridesync::sensors::transport::{NotificationStream, Transport};
use ridesync::sensors::types::{Clock, Metric, SensorError};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Counters observed by tests after the transport is boxed away.
#[derive(Debug, Default)]
pub struct TransportCalls {
    pub requests: AtomicUsize,
    pub disconnects: AtomicUsize,
}

/// Transport that connects instantly and emits a fixed list of frames.
pub struct ScriptedTransport {
    frames: Vec<Vec<u8>>,
    fail_with: Option<SensorError>,
    connected: bool,
    calls: Arc<TransportCalls>,
}

impl ScriptedTransport {
    pub fn new(frames: Vec<Vec<u8>>) -> (Self, Arc<TransportCalls>) {
        let calls = Arc::new(TransportCalls::default());
        let transport = Self {
            frames,
            fail_with: None,
            connected: false,
            calls: calls.clone(),
        };
        (transport, calls)
    }

    /// Transport whose device request always fails with `error`.
    pub fn failing(error: SensorError) -> (Self, Arc<TransportCalls>) {
        let (mut transport, calls) = Self::new(Vec::new());
        transport.fail_with = Some(error);
        (transport, calls)
    }
}

impl Transport for ScriptedTransport {
    fn request_device(&mut self, _metric: Metric) -> BoxFuture<'_, Result<(), SensorError>> {
        self.calls.requests.fetch_add(1, Ordering::SeqCst);
        let result = match self.fail_with.take() {
            Some(error) => Err(error),
            None => {
                self.connected = true;
                Ok(())
            }
        };
        futures::future::ready(result).boxed()
    }

    fn on_notification(&mut self) -> BoxFuture<'_, Result<NotificationStream, SensorError>> {
        let result = if self.connected {
            Ok(futures::stream::iter(std::mem::take(&mut self.frames)).boxed())
        } else {
            Err(SensorError::NotConnected)
        };
        futures::future::ready(result).boxed()
    }

    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), SensorError>> {
        self.calls.disconnects.fetch_add(1, Ordering::SeqCst);
        self.connected = false;
        futures::future::ready(Ok(())).boxed()
    }
}

/// Clock advancing one second per reading.
#[derive(Debug)]
pub struct SteppingClock {
    next: AtomicI64,
}

impl SteppingClock {
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl Clock for SteppingClock {
    fn now_ms(&self) -> i64 {
        self.next.fetch_add(1000, Ordering::SeqCst)
    }
}

/// Cycling power frame for `watts`.
pub fn power_frame(watts: u16) -> Vec<u8> {
    let mut frame = vec![0x00, 0x00];
    frame.extend_from_slice(&watts.to_le_bytes());
    frame
}

/// CSC frame with crank data only.
pub fn crank_frame(crank_revs: u16, crank_time: u16) -> Vec<u8> {
    let mut frame = vec![0x02];
    frame.extend_from_slice(&crank_revs.to_le_bytes());
    frame.extend_from_slice(&crank_time.to_le_bytes());
    frame
}
