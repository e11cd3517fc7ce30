//! ADXL345 USB capture - serial CSV streaming bridge
//!
//! Opens a serial-attached ADXL345 board, negotiates a sample rate over the
//! firmware's line protocol (`F=<hz>` command, CSV header, CSV rows), and
//! streams timestamped samples to the console and/or a capture file until
//! the operator quits, a configured duration elapses, or the device goes
//! away.

pub mod config;
pub mod error;
pub mod keys;
pub mod protocol;
pub mod session;
pub mod transport;

pub use config::SessionConfig;
pub use error::CaptureError;
pub use session::{CaptureSession, SessionState, StopReason, SummaryStats};
