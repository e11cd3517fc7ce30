//! Error taxonomy and the process exit-code contract

use std::io;

/// Errors surfaced by the capture core.
///
/// Configuration problems exit 1 and are raised before any device I/O;
/// everything else is a device/port/protocol failure and exits 2.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// Rejected during validation, before the port is touched
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serial device could not be opened (missing path, permissions)
    #[error("cannot open {port}: {source}")]
    Port {
        port: String,
        #[source]
        source: serialport::Error,
    },

    /// Serial enumeration layer unusable (startup probe)
    #[error("serial support unavailable: {0}")]
    SerialStack(serialport::Error),

    /// Handshake failed: no usable header line from the device
    #[error("protocol failure on {port}: {reason}")]
    Protocol { port: String, reason: String },

    /// Header arity does not match the configured sensor mode
    #[error("header schema mismatch: device is {received}, configuration expects {expected}")]
    SchemaMismatch {
        expected: &'static str,
        received: &'static str,
    },

    /// Connection dropped or write failed mid-stream
    #[error("serial I/O failed during {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: io::Error,
    },

    /// Untyped failures from sink plumbing
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptureError {
    /// Exit code for this error: 1 for configuration, 2 for device failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            CaptureError::Config(_) => 1,
            _ => 2,
        }
    }
}
