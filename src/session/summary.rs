//! Capture accounting and the final stderr report

use std::time::Instant;

use chrono::{DateTime, Local};

use crate::protocol::Sample;

use super::state::StopReason;

/// Counters accumulated over one capture session.
///
/// Created when the session starts, mutated only by the session, finalized
/// and rendered exactly once when the session closes.
#[derive(Debug, Clone)]
pub struct SummaryStats {
    samples: u64,
    malformed: u64,
    started_wall: DateTime<Local>,
    started: Instant,
    elapsed_s: f64,
    reason: Option<StopReason>,
}

impl SummaryStats {
    pub fn start() -> Self {
        Self {
            samples: 0,
            malformed: 0,
            started_wall: Local::now(),
            started: Instant::now(),
            elapsed_s: 0.0,
            reason: None,
        }
    }

    pub fn record(&mut self, _sample: &Sample) {
        self.samples += 1;
    }

    pub fn record_malformed(&mut self) {
        self.malformed += 1;
    }

    /// Fix the elapsed time and the termination reason.
    pub fn finalize(&mut self, reason: StopReason) {
        self.elapsed_s = self.started.elapsed().as_secs_f64();
        self.reason = Some(reason);
    }

    /// Fixed-format report for stderr.
    pub fn render(&self) -> String {
        let reason = self
            .reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".into());
        let mut report = format!(
            "Captured {} samples in {:.2} s ({reason})",
            self.samples, self.elapsed_s
        );
        if self.malformed > 0 {
            report.push_str(&format!("\nSkipped {} malformed lines", self.malformed));
        }
        report
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    pub fn reason(&self) -> Option<StopReason> {
        self.reason
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_wall
    }

    pub fn elapsed_s(&self) -> f64 {
        self.elapsed_s
    }
}
