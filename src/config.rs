//! Session configuration assembled from CLI arguments and environment

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CaptureError;

/// Firmware UART rate (`Serial.begin(2'000'000)` on the board).
pub const DEFAULT_BAUD: u32 = 2_000_000;

/// Environment variable overriding the serial baud rate.
pub const BAUD_ENV: &str = "ADXL345USB_BAUD";

/// Sample-rate bounds accepted by the firmware's `F=` command.
pub const FREQ_MIN: u32 = 1;
pub const FREQ_MAX: u32 = 3200;

/// Poll interval for the streaming read loop. The stop flag and the
/// duration deadline are re-checked at least this often.
const READ_TIMEOUT: Duration = Duration::from_millis(200);

/// Validated capture-session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Serial device path (e.g. /dev/ttyACM0)
    pub port: String,

    /// Requested sample frequency in Hz
    pub frequency_hz: u32,

    /// Stop after this many seconds; None runs until quit or EOF
    pub duration: Option<f64>,

    /// Append rows to this CSV file
    pub output: Option<PathBuf>,

    /// Expect two sensors per sample (DUAL_SPI firmware)
    pub dual: bool,

    /// Echo rows to stdout
    pub console: bool,

    /// Serial baud rate
    pub baud: u32,

    /// Bounded timeout for each serial read
    pub read_timeout: Duration,
}

impl SessionConfig {
    /// Build a validated config from CLI-level inputs.
    ///
    /// Console output stays on unless a capture file silences it; `tee`
    /// re-enables it in file mode. The baud rate comes from the
    /// environment when overridden.
    pub fn new(
        port: String,
        frequency_hz: u32,
        duration: Option<f64>,
        output: Option<PathBuf>,
        dual: bool,
        tee: bool,
    ) -> Result<Self, CaptureError> {
        let config = Self {
            console: output.is_none() || tee,
            baud: baud_from_env(),
            read_timeout: READ_TIMEOUT,
            port,
            frequency_hz,
            duration,
            output,
            dual,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the firmware would silently ignore, before any I/O.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.frequency_hz < FREQ_MIN || self.frequency_hz > FREQ_MAX {
            return Err(CaptureError::Config(format!(
                "frequency {} Hz out of range ({FREQ_MIN}..={FREQ_MAX})",
                self.frequency_hz
            )));
        }
        if let Some(t) = self.duration {
            if !t.is_finite() || t <= 0.0 {
                return Err(CaptureError::Config(format!(
                    "capture duration {t} s must be positive"
                )));
            }
        }
        Ok(())
    }
}

fn baud_from_env() -> u32 {
    baud_override(std::env::var(BAUD_ENV).ok().as_deref())
}

fn baud_override(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_BAUD)
}
