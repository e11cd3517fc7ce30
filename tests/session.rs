//! Capture-session scenarios against the simulated device
#![cfg(unix)]

mod common;

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use adxl_capture::config::SessionConfig;
use adxl_capture::error::CaptureError;
use adxl_capture::session::{CaptureSession, StopReason};

use common::{SimDevice, SimOptions};

fn file_config(port: &str, duration: f64, output: PathBuf) -> SessionConfig {
    SessionConfig::new(port.to_string(), 250, Some(duration), Some(output), false, false)
        .expect("valid config")
}

#[test]
fn records_every_streamed_sample_to_the_file() {
    let mut sim = SimDevice::start(SimOptions::default());
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("cap.csv");

    let summary = CaptureSession::new(file_config(sim.path(), 1.0, csv.clone()))
        .run()
        .expect("capture succeeds");
    sim.stop();

    assert_eq!(summary.reason(), Some(StopReason::DurationElapsed));
    assert!(
        summary.samples() >= 200,
        "expected ~250 samples, got {}",
        summary.samples()
    );
    assert_eq!(summary.malformed(), 0);

    let contents = std::fs::read_to_string(&csv).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("time,x,y,z"));
    let rows = lines.count();
    assert_eq!(rows as u64, summary.samples());
}

#[test]
fn quit_key_outranks_the_duration_deadline() {
    let mut sim = SimDevice::start(SimOptions::default());
    let dir = tempfile::tempdir().unwrap();

    let session = CaptureSession::new(file_config(sim.path(), 0.001, dir.path().join("q.csv")));
    // both stop conditions are true the moment streaming begins
    session.stop_flag().store(true, Ordering::SeqCst);
    let summary = session.run().expect("capture succeeds");
    sim.stop();

    assert_eq!(summary.reason(), Some(StopReason::QuitKey));
}

#[test]
fn dual_sensor_rows_round_trip() {
    let mut sim = SimDevice::start(SimOptions {
        dual: true,
        ..SimOptions::default()
    });
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("dual.csv");

    let config =
        SessionConfig::new(sim.path().to_string(), 250, Some(0.5), Some(csv.clone()), true, false)
            .unwrap();
    let summary = CaptureSession::new(config).run().expect("capture succeeds");
    sim.stop();

    assert!(summary.samples() > 0);
    let contents = std::fs::read_to_string(&csv).unwrap();
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("time,x0,y0,z0,x1,y1,z1"));
    for row in lines {
        assert_eq!(row.split(',').count(), 7, "bad row {row:?}");
    }
}

#[test]
fn header_schema_must_match_the_dual_flag() {
    let mut sim = SimDevice::start(SimOptions::default());

    // single-sensor device, dual-sensor configuration
    let config =
        SessionConfig::new(sim.path().to_string(), 250, Some(1.0), None, true, false).unwrap();
    let err = CaptureSession::new(config).run().unwrap_err();
    sim.stop();

    assert!(
        matches!(err, CaptureError::SchemaMismatch { .. }),
        "unexpected error: {err}"
    );
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn negotiation_gives_up_on_a_mute_device() {
    let mut sim = SimDevice::start(SimOptions {
        respond: false,
        ..SimOptions::default()
    });

    let config =
        SessionConfig::new(sim.path().to_string(), 250, Some(1.0), None, false, false).unwrap();
    let err = CaptureSession::new(config).run().unwrap_err();
    sim.stop();

    assert!(
        matches!(err, CaptureError::Protocol { .. }),
        "unexpected error: {err}"
    );
    assert!(err.to_string().contains("header"), "{err}");
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn malformed_lines_are_counted_not_fatal() {
    let mut sim = SimDevice::start(SimOptions {
        garbage_every: Some(50),
        ..SimOptions::default()
    });
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("noisy.csv");

    let summary = CaptureSession::new(file_config(sim.path(), 1.0, csv.clone()))
        .run()
        .expect("capture survives protocol hiccups");
    sim.stop();

    assert!(summary.samples() > 0);
    assert!(
        summary.malformed() >= 1,
        "garbage rows should have been counted"
    );

    // malformed lines never reach the sinks
    let contents = std::fs::read_to_string(&csv).unwrap();
    let rows = contents.lines().skip(1).count();
    assert_eq!(rows as u64, summary.samples());
    assert!(!contents.contains("not,numeric"));
}

#[test]
fn missing_port_reports_cannot_open() {
    let config =
        SessionConfig::new("/dev/ttyDoesNotExist".to_string(), 250, Some(1.0), None, false, false)
            .unwrap();
    let err = CaptureSession::new(config).run().unwrap_err();

    assert!(matches!(err, CaptureError::Port { .. }), "{err}");
    assert!(err.to_string().to_lowercase().contains("cannot open"), "{err}");
    assert_eq!(err.exit_code(), 2);
}
