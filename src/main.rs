//! adxl-capture - stream CSV samples from a serial-attached ADXL345
//!
//! Opens the serial device, negotiates the sample rate with the firmware's
//! `F=` command, and streams timestamped rows to the console and/or a
//! capture file. Press Q (or configure a duration) to stop.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use adxl_capture::config::SessionConfig;
use adxl_capture::error::CaptureError;
use adxl_capture::session::CaptureSession;

#[derive(Parser, Debug)]
#[command(
    name = "adxl-capture",
    about = "Capture CSV accelerometer data from an ADXL345 USB board"
)]
struct Args {
    /// Serial device of the board
    #[arg(short, long, default_value = "/dev/ttyACM0")]
    port: String,

    /// Sample frequency in Hz (1-3200)
    #[arg(short, long, default_value_t = 250)]
    freq: u32,

    /// Stop after this many seconds (default: run until Q)
    #[arg(short = 't', long = "time")]
    time: Option<f64>,

    /// Save rows to this CSV file instead of the console
    #[arg(short = 's', long = "save")]
    save: Option<PathBuf>,

    /// Device runs the dual-sensor firmware
    #[arg(long)]
    dual: bool,

    /// Echo rows to the console even when saving to a file
    #[arg(long)]
    tee: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // stdout carries the banner and CSV rows; everything else goes to stderr
    let default_level = if args.verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(args: Args) -> Result<(), CaptureError> {
    let config = SessionConfig::new(
        args.port, args.freq, args.time, args.save, args.dual, args.tee,
    )?;

    // startup probe: a broken serial stack is a device failure, reported
    // before any port is touched
    serialport::available_ports().map_err(CaptureError::SerialStack)?;

    info!(
        "port {}, {} Hz, {} baud",
        config.port, config.frequency_hz, config.baud
    );

    CaptureSession::new(config).run()?;
    Ok(())
}
