//! Simulated ADXL345 device over a PTY pair.
//!
//! External test collaborator: honors only the wire protocol (`F=`
//! command, header line, paced CSV rows) and knows nothing about the
//! session internals. The capture side opens the slave end of the PTY by
//! path, exactly as it would a real USB CDC device.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serialport::{SerialPort, TTYPort};

/// Behavior knobs for one simulated device.
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Emit the dual-sensor header and rows
    pub dual: bool,
    /// Respond to `F=` with a header (false = mute device)
    pub respond: bool,
    /// Replace every Nth data row with a non-numeric line
    pub garbage_every: Option<u64>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dual: false,
            respond: true,
            garbage_every: None,
        }
    }
}

pub struct SimDevice {
    path: String,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    // keeps the slave side of the PTY alive while the capture process
    // opens and closes it by path
    _slave: TTYPort,
}

impl SimDevice {
    /// Start a simulated device and return once its PTY path is usable.
    pub fn start(opts: SimOptions) -> SimDevice {
        let (master, slave) = TTYPort::pair().expect("pty pair");
        let path = slave.name().expect("pty slave path");

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let handle = thread::Builder::new()
            .name("sim-adxl".to_string())
            .spawn(move || run_device(master, opts, thread_stop))
            .expect("spawn simulator");

        SimDevice {
            path,
            stop,
            handle: Some(handle),
            _slave: slave,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SimDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_device(mut master: TTYPort, opts: SimOptions, stop: Arc<AtomicBool>) {
    master.set_timeout(Duration::from_millis(2)).ok();

    let mut period = Duration::from_millis(4);
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 256];
    let mut t0 = Instant::now();
    let mut next_row = Instant::now();
    let mut rows: u64 = 0;
    let mut streaming = false;

    while !stop.load(Ordering::SeqCst) {
        match master.read(&mut chunk) {
            Ok(0) => {}
            Ok(n) => pending.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
            Err(_) => break,
        }

        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            let cmd = String::from_utf8_lossy(&line).trim().to_ascii_uppercase();
            let Some(value) = cmd.strip_prefix("F=") else {
                continue;
            };
            let Ok(freq) = value.parse::<u32>() else {
                continue;
            };
            if opts.respond && (1..=3200).contains(&freq) {
                period = Duration::from_secs_f64(1.0 / f64::from(freq));
                t0 = Instant::now();
                next_row = t0 + period;
                rows = 0;
                streaming = true;
                let header = if opts.dual {
                    "time,x0,y0,z0,x1,y1,z1"
                } else {
                    "time,x,y,z"
                };
                if writeln!(master, "{header}").is_err() {
                    return;
                }
            }
        }

        // catch up on every row that came due since the last pass
        while streaming && Instant::now() >= next_row {
            rows += 1;
            let garbage = opts.garbage_every.is_some_and(|n| rows % n == 0);
            let row = if garbage {
                "this,is,not,numeric".to_string()
            } else {
                fake_row(t0.elapsed().as_secs_f64(), opts.dual, rows)
            };
            if writeln!(master, "{row}").is_err() {
                return;
            }
            next_row += period;
        }
    }
}

/// Deterministic wobble well inside +/-1 g, 6-decimal fixed point like the
/// firmware.
fn fake_row(t: f64, dual: bool, seq: u64) -> String {
    let phase = seq as f64 * 0.1;
    let x = 0.02 * phase.sin();
    let y = 0.02 * phase.cos();
    let z = 0.98 + 0.01 * (phase * 0.5).sin();
    if dual {
        format!(
            "{t:.6},{x:.6},{y:.6},{z:.6},{:.6},{:.6},{z:.6}",
            -x, -y
        )
    } else {
        format!("{t:.6},{x:.6},{y:.6},{z:.6}")
    }
}
