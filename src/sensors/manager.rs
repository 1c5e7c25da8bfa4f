//! Sensor manager owning the per-metric connection state.
//!
//! Connects at most one session per metric, wires every session into the
//! shared measurement store, and reports progress on an event channel.

use crate::recording::store::SharedStore;
use crate::sensors::session::{ConnectionSession, SampleListener};
use crate::sensors::transport::{BleTransport, Transport};
use crate::sensors::types::{
    Clock, ConnectionState, Metric, SensorConfig, SensorError, SensorEvent, SensorSource,
    SystemClock,
};
use crossbeam::channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Manages sensor connections and feeds their samples into the store.
pub struct SensorManager {
    /// Configuration
    config: SensorConfig,
    /// Destination of accepted samples
    store: SharedStore,
    /// Capture-time source handed to sessions
    clock: Arc<dyn Clock>,
    /// Live sessions, at most one per metric
    sessions: HashMap<Metric, ConnectionSession>,
    /// Channel for sending sensor events
    event_tx: Option<Sender<SensorEvent>>,
    /// Number of mock sessions started, mixed into each mock seed
    mock_starts: u64,
}

impl SensorManager {
    /// Create a new sensor manager writing into `store`.
    pub fn new(config: SensorConfig, store: SharedStore) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    /// Create a sensor manager with an explicit capture clock.
    pub fn with_clock(config: SensorConfig, store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
            sessions: HashMap::new(),
            event_tx: None,
            mock_starts: 0,
        }
    }

    /// Get an event receiver for sensor events.
    pub fn event_receiver(&mut self) -> Receiver<SensorEvent> {
        let (tx, rx) = crossbeam::channel::unbounded();
        self.event_tx = Some(tx);
        rx
    }

    /// Send an event if the channel is available.
    fn send_event(&self, event: SensorEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Connect a metric using the configured source.
    pub async fn connect(&mut self, metric: Metric) -> Result<(), SensorError> {
        match self.config.source {
            SensorSource::Bluetooth => {
                let timeout = Duration::from_secs(self.config.discovery_timeout_secs);
                self.connect_with(metric, Box::new(BleTransport::new(timeout)))
                    .await
            }
            SensorSource::Mock => self.connect_mock(metric),
        }
    }

    /// Connect a metric through a specific transport.
    ///
    /// Rejected with [`SensorError::AlreadyConnected`] while a session for
    /// the metric is live; the existing session is left untouched.
    pub async fn connect_with(
        &mut self,
        metric: Metric,
        transport: Box<dyn Transport>,
    ) -> Result<(), SensorError> {
        self.ensure_disconnected(metric)?;

        self.send_event(SensorEvent::ConnectionChanged {
            metric,
            state: ConnectionState::Connecting,
        });

        let listener = self.store_listener(metric);
        match ConnectionSession::connect(metric, transport, self.clock.clone(), listener).await {
            Ok(session) => {
                self.register(session);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to connect {} sensor: {}", metric, e);
                self.send_event(SensorEvent::Error(e.to_string()));
                self.send_event(SensorEvent::ConnectionChanged {
                    metric,
                    state: ConnectionState::Disconnected,
                });
                Err(e)
            }
        }
    }

    /// Connect a synthetic sensor for a metric.
    pub fn connect_mock(&mut self, metric: Metric) -> Result<(), SensorError> {
        self.ensure_disconnected(metric)?;

        self.mock_starts += 1;
        let seed = self.config.mock_seed ^ self.mock_starts.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let listener = self.store_listener(metric);
        let session = ConnectionSession::mock(metric, self.clock.clone(), seed, listener);
        self.register(session);
        Ok(())
    }

    fn ensure_disconnected(&self, metric: Metric) -> Result<(), SensorError> {
        if self.sessions.contains_key(&metric) {
            tracing::warn!("{} sensor is already connected", metric);
            return Err(SensorError::AlreadyConnected(metric));
        }
        Ok(())
    }

    /// Listener adding a metric's samples to the store and reporting the outcome.
    fn store_listener(&self, metric: Metric) -> SampleListener {
        let store = self.store.clone();
        let event_tx = self.event_tx.clone();

        Box::new(move |sample| {
            let result = match store.lock() {
                Ok(mut store) => store.add(metric, sample),
                Err(_) => {
                    tracing::error!("Measurement store lock poisoned, dropping {} sample", metric);
                    return;
                }
            };

            let event = match result {
                Ok(()) => SensorEvent::Sample { metric, sample },
                Err(e) => {
                    tracing::warn!("Rejected sample: {}", e);
                    SensorEvent::Rejected(e)
                }
            };
            if let Some(tx) = &event_tx {
                let _ = tx.send(event);
            }
        })
    }

    /// Remember a session that is already feeding the store.
    fn register(&mut self, session: ConnectionSession) {
        let metric = session.metric();
        self.sessions.insert(metric, session);
        self.send_event(SensorEvent::ConnectionChanged {
            metric,
            state: ConnectionState::Connected,
        });
    }

    /// Disconnect a metric's sensor. Does nothing when it is not connected.
    pub async fn disconnect(&mut self, metric: Metric) -> Result<(), SensorError> {
        let Some(mut session) = self.sessions.remove(&metric) else {
            return Ok(());
        };

        let result = session.disconnect().await;
        if let Err(e) = &result {
            tracing::warn!("Error while disconnecting {} sensor: {}", metric, e);
        }

        self.send_event(SensorEvent::ConnectionChanged {
            metric,
            state: ConnectionState::Disconnected,
        });

        result
    }

    /// Current connection state of a metric.
    pub fn connection_state(&self, metric: Metric) -> ConnectionState {
        if self.is_connected(metric) {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    pub fn is_connected(&self, metric: Metric) -> bool {
        self.sessions.contains_key(&metric)
    }

    /// Metrics with a live session.
    pub fn connected_metrics(&self) -> Vec<Metric> {
        let mut metrics: Vec<Metric> = self.sessions.keys().copied().collect();
        metrics.sort();
        metrics
    }

    /// Disconnect every sensor.
    pub async fn shutdown(&mut self) {
        tracing::info!("Shutting down SensorManager");

        for metric in self.connected_metrics() {
            let _ = self.disconnect(metric).await;
        }
    }
}
