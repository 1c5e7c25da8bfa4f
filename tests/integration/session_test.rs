//! Integration tests for connection sessions over a scripted transport.

use crate::scripted_transport::{crank_frame, power_frame, ScriptedTransport, SteppingClock};
use ridesync::recording::types::Sample;
use ridesync::sensors::session::{ConnectionSession, SampleListener};
use ridesync::sensors::types::{Metric, SensorError};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn collector() -> (Arc<Mutex<Vec<Sample>>>, SampleListener) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    (received, Box::new(move |sample| sink.lock().unwrap().push(sample)))
}

#[tokio::test(start_paused = true)]
async fn test_power_frames_reach_listener_with_capture_time() {
    let frames = vec![power_frame(200), vec![0x00, 0x00, 0x01], power_frame(215)];
    let (transport, calls) = ScriptedTransport::new(frames);
    let (received, listener) = collector();

    let mut session = ConnectionSession::connect(
        Metric::Power,
        Box::new(transport),
        Arc::new(SteppingClock::starting_at(5_000)),
        listener,
    )
    .await
    .unwrap();

    tokio::time::sleep(Duration::from_millis(10)).await;

    // The truncated frame is skipped but still consumed a clock reading.
    assert_eq!(
        *received.lock().unwrap(),
        vec![Sample::new(5_000, 200.0), Sample::new(7_000, 215.0)]
    );

    session.disconnect().await.unwrap();
    session.disconnect().await.unwrap();
    assert_eq!(calls.requests.load(Ordering::SeqCst), 1);
    assert_eq!(calls.disconnects.load(Ordering::SeqCst), 1);
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cadence_session_uses_fresh_rollover_state() {
    let clock = Arc::new(SteppingClock::starting_at(0));
    let frames = || vec![crank_frame(65535, 64512), crank_frame(0, 0)];

    for _ in 0..2 {
        let (transport, _) = ScriptedTransport::new(frames());
        let (received, listener) = collector();
        let mut session = ConnectionSession::connect(
            Metric::Cadence,
            Box::new(transport),
            clock.clone(),
            listener,
        )
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Baseline first, then 1 revolution across the wrap in 1 s
        let values: Vec<f64> = received.lock().unwrap().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![60.0]);

        session.disconnect().await.unwrap();
    }
}

#[tokio::test]
async fn test_failed_connect_releases_transport() {
    let (transport, calls) =
        ScriptedTransport::failing(SensorError::SensorNotFound(Metric::HeartRate));

    let (received, listener) = collector();

    let result = ConnectionSession::connect(
        Metric::HeartRate,
        Box::new(transport),
        Arc::new(SteppingClock::starting_at(0)),
        listener,
    )
    .await;

    assert!(matches!(result, Err(SensorError::SensorNotFound(Metric::HeartRate))));
    assert_eq!(calls.disconnects.load(Ordering::SeqCst), 1);
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_first_frames_reach_listener_on_worker_threads() {
    for _ in 0..50 {
        let frames: Vec<Vec<u8>> = (0..20u16).map(|w| power_frame(100 + w)).collect();
        let (transport, _) = ScriptedTransport::new(frames);
        let (received, listener) = collector();

        let mut session = ConnectionSession::connect(
            Metric::Power,
            Box::new(transport),
            Arc::new(SteppingClock::starting_at(0)),
            listener,
        )
        .await
        .unwrap();

        for _ in 0..200 {
            if received.lock().unwrap().len() == 20 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 20);
        assert_eq!(received[0], Sample::new(0, 100.0));
        drop(received);
        session.disconnect().await.unwrap();
    }
}
