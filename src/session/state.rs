//! Session lifecycle types

use std::fmt;

/// Capture lifecycle; owned exclusively by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Negotiating,
    Streaming,
    Stopping,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Negotiating => "negotiating",
            SessionState::Streaming => "streaming",
            SessionState::Stopping => "stopping",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Why the streaming loop ended. When several conditions fire at once the
/// quit key wins over the duration deadline, which wins over end-of-stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    QuitKey,
    DurationElapsed,
    EndOfStream,
    DeviceError,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StopReason::QuitKey => "quit key",
            StopReason::DurationElapsed => "duration elapsed",
            StopReason::EndOfStream => "end of stream",
            StopReason::DeviceError => "device error",
        };
        f.write_str(name)
    }
}
