//! Capture session: the state machine driving handshake, streaming, and
//! shutdown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::error::CaptureError;
use crate::keys;
use crate::protocol::{ProtocolDriver, Reading};
use crate::transport::Transport;

use super::sink::SampleSink;
use super::state::{SessionState, StopReason};
use super::summary::SummaryStats;

/// One capture from open to summary.
///
/// Owns the session state, the summary counters, and (through the protocol
/// driver) the serial connection. The stop flag is the only state shared
/// with the keypress watcher.
pub struct CaptureSession {
    config: SessionConfig,
    state: SessionState,
    summary: SummaryStats,
    stop: Arc<AtomicBool>,
}

impl CaptureSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_stop(config, Arc::new(AtomicBool::new(false)))
    }

    /// Build with an externally shared stop flag. The keypress watcher, a
    /// duration timer, or a test harness may all raise it; setting it is
    /// idempotent.
    pub fn with_stop(config: SessionConfig, stop: Arc<AtomicBool>) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            summary: SummaryStats::start(),
            stop,
        }
    }

    /// Handle on the session's stop flag.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the capture to completion and return the finalized summary.
    ///
    /// The port handle and the file sink are released on every exit path;
    /// a mid-stream device failure still renders the summary before the
    /// error propagates.
    pub fn run(mut self) -> Result<SummaryStats, CaptureError> {
        self.config.validate()?;

        self.set_state(SessionState::Negotiating);
        let transport =
            Transport::open(&self.config.port, self.config.baud, self.config.read_timeout)?;
        let mut driver = ProtocolDriver::new(transport);

        let schema = match driver.negotiate(self.config.frequency_hz, self.config.dual) {
            Ok(schema) => schema,
            Err(e) => {
                driver.close();
                self.set_state(SessionState::Closed);
                return Err(e);
            }
        };

        let mut sink = match SampleSink::new(self.config.console, self.config.output.as_deref()) {
            Ok(sink) => sink,
            Err(e) => {
                driver.close();
                self.set_state(SessionState::Closed);
                return Err(e.into());
            }
        };

        info!(
            "capture started at {} ({} Hz, {})",
            self.summary.started_at().format("%Y-%m-%d %H:%M:%S"),
            self.config.frequency_hz,
            schema.label()
        );

        println!("Press Q to stop");
        if let Err(e) = sink.write_header(schema) {
            driver.close();
            self.set_state(SessionState::Closed);
            return Err(e.into());
        }

        self.set_state(SessionState::Streaming);
        if keys::spawn_stdin_watcher(self.stop.clone()) {
            debug!("keypress watcher active");
        }
        let deadline = self
            .config
            .duration
            .map(|secs| Instant::now() + Duration::from_secs_f64(secs));

        let (reason, fatal) = self.stream(&mut driver, &mut sink, deadline);

        self.set_state(SessionState::Stopping);
        if let Err(e) = sink.flush() {
            warn!("sink flush failed: {e:#}");
        }
        driver.close();

        self.summary.finalize(reason);
        eprintln!("{}", self.summary.render());
        self.set_state(SessionState::Closed);

        match fatal {
            Some(e) => Err(e),
            None => Ok(self.summary),
        }
    }

    /// Streaming loop. Returns the stop reason and, for device failures,
    /// the error to propagate once the summary is out.
    fn stream(
        &mut self,
        driver: &mut ProtocolDriver,
        sink: &mut SampleSink,
        deadline: Option<Instant>,
    ) -> (StopReason, Option<CaptureError>) {
        loop {
            if let Some(reason) = self.stop_condition(deadline) {
                return (reason, None);
            }
            match driver.next_sample() {
                Ok(Reading::Sample(sample)) => {
                    if let Err(e) = sink.write_sample(&sample) {
                        return (StopReason::DeviceError, Some(e.into()));
                    }
                    self.summary.record(&sample);
                }
                Ok(Reading::Malformed(_)) => self.summary.record_malformed(),
                Ok(Reading::Idle) => {}
                Ok(Reading::Eof) => {
                    // a quit key or deadline racing the EOF still wins
                    let reason = self
                        .stop_condition(deadline)
                        .unwrap_or(StopReason::EndOfStream);
                    return (reason, None);
                }
                Err(e) => {
                    warn!("device failure while streaming: {e}");
                    let reason = self
                        .stop_condition(deadline)
                        .unwrap_or(StopReason::DeviceError);
                    let fatal = (reason == StopReason::DeviceError).then_some(e);
                    return (reason, fatal);
                }
            }
        }
    }

    /// Evaluate the stop conditions in priority order:
    /// quit key > duration deadline.
    fn stop_condition(&self, deadline: Option<Instant>) -> Option<StopReason> {
        if self.stop.load(Ordering::SeqCst) {
            return Some(StopReason::QuitKey);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Some(StopReason::DurationElapsed);
        }
        None
    }

    fn set_state(&mut self, next: SessionState) {
        debug!("session state: {} -> {}", self.state, next);
        self.state = next;
    }
}
