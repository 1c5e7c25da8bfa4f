//! RideSync - cycling sensor recorder
//!
//! Records from the configured sensors for a number of seconds, logging the
//! live readout once per second, then writes JSON, TCX and CSV exports.
//!
//! Usage: `ridesync [SECONDS]` (default 10)

use anyhow::{Context, Result};
use ridesync::recording::live::LiveReadout;
use ridesync::recording::timer::format_elapsed;
use ridesync::sensors::types::{Clock, Metric, SystemClock};
use ridesync::storage::config::load_config;
use ridesync::{RideRecorder, SensorManager};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_DURATION_SECS: u64 = 10;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting RideSync v{}", env!("CARGO_PKG_VERSION"));

    let duration_secs = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("invalid duration in seconds: {arg}"))?,
        None => DEFAULT_DURATION_SECS,
    };

    let config = load_config().context("failed to load configuration")?;
    let clock = SystemClock;

    let mut recorder = RideRecorder::new();
    let mut manager = SensorManager::new(config.sensors.to_sensor_config(), recorder.store());

    for metric in Metric::ALL {
        match manager.connect(metric).await {
            Ok(()) => recorder.sensor_connected(clock.now_ms()),
            Err(e) => tracing::warn!("Continuing without {} sensor: {}", metric, e),
        }
    }

    if manager.connected_metrics().is_empty() {
        anyhow::bail!("no sensor could be connected");
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;
    for _ in 0..duration_secs {
        ticker.tick().await;

        let now = clock.now_ms();
        let readout = {
            let store = recorder.snapshot()?;
            LiveReadout::read(
                &store,
                |metric| manager.is_connected(metric),
                now,
                config.recording.staleness_ms,
            )
        };
        tracing::info!(
            "[{}] {}",
            format_elapsed(recorder.timer().elapsed_ms(now)),
            readout
        );
    }

    recorder.timer_mut().stop(clock.now_ms());
    manager.shutdown().await;

    let export_dir = config.recording.export_dir();
    let written = recorder
        .export_to_dir(&export_dir, &chrono::Local::now())
        .with_context(|| format!("failed to export to {}", export_dir.display()))?;

    for path in written {
        println!("{}", path.display());
    }

    Ok(())
}
