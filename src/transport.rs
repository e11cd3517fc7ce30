//! Serial transport: exclusive ownership of one serial connection
//!
//! Line reads are bounded by the port timeout so the caller can re-check
//! its stop conditions between reads instead of parking on the device.

use std::io::{Read, Write};
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use crate::error::CaptureError;

/// Result of one bounded line read.
#[derive(Debug)]
pub enum LineEvent {
    /// A complete line, `\n` / `\r\n` terminator stripped
    Line(String),
    /// No complete line within the read timeout
    TimedOut,
    /// The device closed the stream
    Eof,
}

/// One open serial connection with byte-accurate line assembly.
pub struct Transport {
    port: Option<Box<dyn SerialPort>>,
    name: String,
    pending: Vec<u8>,
}

impl Transport {
    /// Open `path`, holding exactly one OS handle until close or drop.
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, CaptureError> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|source| CaptureError::Port {
                port: path.to_string(),
                source,
            })?;
        debug!("opened {} at {} baud", path, baud);
        Ok(Self {
            port: Some(port),
            name: path.to_string(),
            pending: Vec::with_capacity(256),
        })
    }

    /// Read until a newline, the timeout, or EOF, whichever comes first.
    ///
    /// Partial lines survive a timeout: bytes already received stay in the
    /// assembly buffer for the next call.
    pub fn read_line(&mut self) -> Result<LineEvent, CaptureError> {
        let Some(port) = self.port.as_mut() else {
            return Ok(LineEvent::Eof);
        };
        let mut chunk = [0u8; 256];
        loop {
            if let Some(line) = take_line(&mut self.pending) {
                return Ok(LineEvent::Line(line));
            }
            match port.read(&mut chunk) {
                Ok(0) => return Ok(LineEvent::Eof),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    return Ok(LineEvent::TimedOut)
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(CaptureError::Io { op: "read", source }),
            }
        }
    }

    /// Write raw bytes to the device and push them out.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        let Some(port) = self.port.as_mut() else {
            return Err(CaptureError::Io {
                op: "write",
                source: std::io::Error::new(std::io::ErrorKind::NotConnected, "port closed"),
            });
        };
        port.write_all(bytes)
            .map_err(|source| CaptureError::Io { op: "write", source })?;
        port.flush()
            .map_err(|source| CaptureError::Io { op: "flush", source })
    }

    /// Release the OS handle. Safe to call more than once; reads after
    /// close report end-of-stream.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("closed {}", self.name);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Split the first complete line out of `pending`.
fn take_line(pending: &mut Vec<u8>) -> Option<String> {
    let pos = pending.iter().position(|&b| b == b'\n')?;
    let mut raw: Vec<u8> = pending.drain(..=pos).collect();
    raw.pop();
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    Some(String::from_utf8_lossy(&raw).into_owned())
}
