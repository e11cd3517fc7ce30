//! Protocol driver: frequency handshake and typed sample production

use tracing::{debug, info, warn};

use crate::error::CaptureError;
use crate::transport::{LineEvent, Transport};

use super::parser::{parse_header, parse_sample};
use super::types::{HeaderSchema, Sample};

/// Read timeouts tolerated while waiting for the header line.
const NEGOTIATE_ATTEMPTS: u32 = 10;

/// One read step while streaming.
#[derive(Debug)]
pub enum Reading {
    Sample(Sample),
    /// Line that failed CSV parsing; carries the offending text
    Malformed(String),
    /// Nothing arrived within the read timeout - the caller re-checks its
    /// stop conditions and polls again
    Idle,
    Eof,
}

/// Drives the firmware's line protocol over an exclusively owned transport.
pub struct ProtocolDriver {
    transport: Transport,
    schema: Option<HeaderSchema>,
}

impl ProtocolDriver {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            schema: None,
        }
    }

    /// Send `F=<freq>` and wait for the header line.
    ///
    /// Rows still in flight from a previous rate are skipped. The wait is
    /// bounded: `NEGOTIATE_ATTEMPTS` read timeouts without a header is a
    /// protocol failure.
    pub fn negotiate(
        &mut self,
        frequency_hz: u32,
        dual: bool,
    ) -> Result<HeaderSchema, CaptureError> {
        info!("negotiating {} Hz on {}", frequency_hz, self.transport.name());
        self.transport
            .write(format!("F={frequency_hz}\n").as_bytes())?;

        let mut idle_reads = 0u32;
        loop {
            match self.transport.read_line()? {
                LineEvent::Line(line) => {
                    if let Some(schema) = parse_header(&line) {
                        let expected = if dual {
                            HeaderSchema::Dual
                        } else {
                            HeaderSchema::Single
                        };
                        if schema != expected {
                            return Err(CaptureError::SchemaMismatch {
                                expected: expected.label(),
                                received: schema.label(),
                            });
                        }
                        debug!("header received: {}", line.trim());
                        self.schema = Some(schema);
                        return Ok(schema);
                    }
                    // stale row or banner from before the rate change
                    debug!("skipping pre-header line: {line:?}");
                }
                LineEvent::TimedOut => {
                    idle_reads += 1;
                    if idle_reads >= NEGOTIATE_ATTEMPTS {
                        return Err(CaptureError::Protocol {
                            port: self.transport.name().to_string(),
                            reason: format!(
                                "no header line within {NEGOTIATE_ATTEMPTS} read timeouts"
                            ),
                        });
                    }
                }
                LineEvent::Eof => {
                    return Err(CaptureError::Protocol {
                        port: self.transport.name().to_string(),
                        reason: "stream ended before the header line".into(),
                    });
                }
            }
        }
    }

    /// Pull the next line and classify it against the negotiated schema.
    pub fn next_sample(&mut self) -> Result<Reading, CaptureError> {
        let schema = self.schema.ok_or_else(|| CaptureError::Protocol {
            port: self.transport.name().to_string(),
            reason: "sample read before negotiation".into(),
        })?;

        match self.transport.read_line()? {
            LineEvent::Line(line) => {
                if line.trim().is_empty() || parse_header(&line).is_some() {
                    // blank keep-alives and repeated headers are not data
                    return Ok(Reading::Idle);
                }
                match parse_sample(&line, schema) {
                    Ok(sample) => Ok(Reading::Sample(sample)),
                    Err(e) => {
                        warn!("malformed data line ({e}): {line:?}");
                        Ok(Reading::Malformed(line))
                    }
                }
            }
            LineEvent::TimedOut => Ok(Reading::Idle),
            LineEvent::Eof => Ok(Reading::Eof),
        }
    }

    /// Negotiated schema, once the handshake has completed.
    pub fn schema(&self) -> Option<HeaderSchema> {
        self.schema
    }

    /// Release the underlying connection.
    pub fn close(&mut self) {
        self.transport.close();
    }

    pub fn port_name(&self) -> &str {
        self.transport.name()
    }
}
