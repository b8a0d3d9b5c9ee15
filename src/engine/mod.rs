//! Transcode job supervision
//!
//! One [`JobSupervisor`] per ffmpeg process, polled cooperatively by a
//! [`BatchCoordinator`] on a fixed tick. Progress is measured in
//! microseconds of output written, read from ffmpeg's `-progress` report.

use serde::Serialize;

pub mod batch;
pub mod progress;
pub mod report;
pub mod supervisor;

pub use batch::{BatchCoordinator, BatchReport, BatchSnapshot, JobProgress};
pub use progress::{ConsoleProgressSink, JsonProgressSink, NoOpProgressSink, ProgressSink};
pub use report::ProgressReport;
pub use supervisor::JobSupervisor;

/// Lifecycle of one transcode job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    NotStarted,
    Running,
    /// Process exited with status 0
    Completed,
    /// Nonzero exit, killed, cancelled, or never spawned
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// How a job ended, handed to the caller exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    /// Input file of the job
    pub file_name: String,
    /// `None` when killed by a signal or never spawned
    pub exit_code: Option<i32>,
    pub success: bool,
    pub cancelled: bool,
    /// Everything the process wrote to stderr, or the spawn error
    pub diagnostics: String,
}

impl JobOutcome {
    /// Short status for listings
    pub fn status(&self) -> String {
        if self.cancelled {
            "cancelled".to_string()
        } else if self.success {
            "ok".to_string()
        } else {
            match self.exit_code {
                Some(code) => format!("exit code {}", code),
                None => "failed".to_string(),
            }
        }
    }
}

/// Percentage of `current` over `total`, capped at 100
pub fn percent(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 100.0;
    }
    (current as f64 / total as f64 * 100.0).min(100.0)
}
