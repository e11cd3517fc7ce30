//! Keypress watcher: raises the stop flag on the operator's quit key

use std::io::{IsTerminal, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, info};

/// Quit key, matched case-insensitively.
const QUIT_KEY: u8 = b'q';

/// Watch stdin for the quit key while the session streams.
///
/// Only active when stdin is an interactive terminal; with redirected
/// input the duration deadline and end-of-stream are the only stop
/// conditions. The thread is detached - if the session ends first it is
/// abandoned on its blocking read and dies with the process.
///
/// Returns whether a watcher was actually started.
pub fn spawn_stdin_watcher(stop: Arc<AtomicBool>) -> bool {
    if !std::io::stdin().is_terminal() {
        debug!("stdin is not a terminal, quit key disabled");
        return false;
    }
    thread::Builder::new()
        .name("keypress-watcher".to_string())
        .spawn(move || watch_reader(std::io::stdin().lock(), &stop))
        .is_ok()
}

/// Scan a byte stream and set `stop` once when the quit key appears.
fn watch_reader<R: Read>(mut input: R, stop: &AtomicBool) {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => break,
            Ok(_) if byte[0].eq_ignore_ascii_case(&QUIT_KEY) => {
                info!("quit key received");
                stop.store(true, Ordering::SeqCst);
                break;
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }
}
