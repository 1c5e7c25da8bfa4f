//! Connection session for one metric's sensor.
//!
//! A session owns either a transport plus its notification pump, or a mock
//! ticker. Both expose the same contract: the listener handed to the
//! constructor, plus any added later with [`ConnectionSession::add_listener`],
//! receive every decoded sample, and [`ConnectionSession::disconnect`] stops
//! delivery.

use crate::recording::types::Sample;
use crate::sensors::decoder::{decoder_for, SensorDecoder};
use crate::sensors::mock::{mock_period, MockGenerator};
use crate::sensors::ticker::RecurringTask;
use crate::sensors::transport::{NotificationStream, Transport};
use crate::sensors::types::{Clock, Metric, SensorError};
use futures::stream::StreamExt;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Callback receiving decoded samples.
pub type SampleListener = Box<dyn Fn(Sample) + Send + Sync>;

/// Listener list shared with the producing task.
#[derive(Clone)]
struct Listeners(Arc<Mutex<Vec<SampleListener>>>);

impl Listeners {
    fn with(listener: SampleListener) -> Self {
        Self(Arc::new(Mutex::new(vec![listener])))
    }

    fn push(&self, listener: SampleListener) {
        if let Ok(mut listeners) = self.0.lock() {
            listeners.push(listener);
        }
    }

    fn emit(&self, sample: Sample) {
        if let Ok(listeners) = self.0.lock() {
            for listener in listeners.iter() {
                listener(sample);
            }
        }
    }
}

enum SessionSource {
    /// Real device: transport handle plus the task pumping its notifications
    Transport {
        transport: Box<dyn Transport>,
        pump: JoinHandle<()>,
    },
    /// Synthetic sensor
    Mock { task: RecurringTask },
}

/// A live connection delivering samples for one metric.
pub struct ConnectionSession {
    metric: Metric,
    listeners: Listeners,
    source: Option<SessionSource>,
}

impl ConnectionSession {
    /// Connect through `transport` and start decoding notifications.
    ///
    /// `listener` is registered before the pump is spawned, so it sees the
    /// first frame. Each session gets a fresh decoder, so cadence rollover
    /// state never carries over from a previous connection. On failure the
    /// transport is released before the error is returned.
    pub async fn connect(
        metric: Metric,
        mut transport: Box<dyn Transport>,
        clock: Arc<dyn Clock>,
        listener: SampleListener,
    ) -> Result<Self, SensorError> {
        tracing::info!("Connecting {} sensor", metric);

        let stream = match Self::handshake(metric, transport.as_mut()).await {
            Ok(stream) => stream,
            Err(e) => {
                if let Err(release) = transport.disconnect().await {
                    tracing::warn!("Failed to release {} transport: {}", metric, release);
                }
                return Err(e);
            }
        };

        let listeners = Listeners::with(listener);
        let pump = tokio::spawn(Self::pump(
            stream,
            decoder_for(metric),
            listeners.clone(),
            clock,
        ));

        tracing::info!("Connected {} sensor", metric);

        Ok(Self {
            metric,
            listeners,
            source: Some(SessionSource::Transport { transport, pump }),
        })
    }

    /// Start a synthetic sensor feeding `listener`. Must be called inside a
    /// tokio runtime.
    pub fn mock(
        metric: Metric,
        clock: Arc<dyn Clock>,
        seed: u64,
        listener: SampleListener,
    ) -> Self {
        let listeners = Listeners::with(listener);
        let mut generator = MockGenerator::new(metric, seed);

        let emit_to = listeners.clone();
        let task = RecurringTask::spawn(mock_period(metric), move || {
            emit_to.emit(generator.next_sample(clock.now_ms()));
        });

        tracing::info!("Started mock {} sensor", metric);

        Self {
            metric,
            listeners,
            source: Some(SessionSource::Mock { task }),
        }
    }

    async fn handshake(
        metric: Metric,
        transport: &mut dyn Transport,
    ) -> Result<NotificationStream, SensorError> {
        transport.request_device(metric).await?;
        transport.on_notification().await
    }

    /// Decode frames until the stream ends or the task is aborted.
    async fn pump(
        mut stream: NotificationStream,
        mut decoder: Box<dyn SensorDecoder>,
        listeners: Listeners,
        clock: Arc<dyn Clock>,
    ) {
        let metric = decoder.metric();

        while let Some(frame) = stream.next().await {
            match decoder.decode(&frame, clock.now_ms()) {
                Ok(Some(sample)) => listeners.emit(sample),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping malformed frame: {}", e),
            }
        }

        tracing::info!("{} notification stream ended", metric);
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Register another callback. It only sees samples decoded after this call.
    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(Sample) + Send + Sync + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Whether `disconnect` has not been called yet.
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Stop sample delivery and release the device.
    ///
    /// Calling it on an already disconnected session does nothing.
    pub async fn disconnect(&mut self) -> Result<(), SensorError> {
        let Some(source) = self.source.take() else {
            return Ok(());
        };

        tracing::info!("Disconnecting {} sensor", self.metric);

        match source {
            SessionSource::Transport {
                mut transport,
                pump,
            } => {
                pump.abort();
                transport.disconnect().await
            }
            SessionSource::Mock { mut task } => {
                task.stop();
                Ok(())
            }
        }
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        // The transport cannot be released without awaiting; stop delivery at least.
        match self.source.take() {
            Some(SessionSource::Transport { pump, .. }) => pump.abort(),
            Some(SessionSource::Mock { mut task }) => task.stop(),
            None => {}
        }
    }
}
