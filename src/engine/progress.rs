//! Progress rendering for batch runs

use std::io::Write;

use crate::engine::{BatchReport, BatchSnapshot, JobOutcome, JobState};

const BAR_WIDTH: usize = 20;

/// Receives batch events from [`crate::engine::BatchCoordinator::run`]
pub trait ProgressSink: Send + Sync {
    /// Called once after launch, before the first tick
    fn on_start(&self, snapshot: &BatchSnapshot);

    /// Called after every poll
    fn on_tick(&self, snapshot: &BatchSnapshot);

    /// Called once per job when it ends
    fn on_job_finished(&self, outcome: &JobOutcome);

    /// Called once when the batch is over
    fn on_finish(&self, report: &BatchReport);
}

/// Status line on stderr for interactive use
pub struct ConsoleProgressSink {
    verbose: bool,
}

impl ConsoleProgressSink {
    /// `verbose` lists every file when the batch starts
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Text printed before the first tick
    pub fn start_message(&self, snapshot: &BatchSnapshot) -> String {
        let mut message = format!("Converting {} file(s)", snapshot.jobs.len());
        if self.verbose {
            for job in &snapshot.jobs {
                message.push_str("\n   ");
                message.push_str(&job.file_name);
            }
        }
        message
    }
}

impl ProgressSink for ConsoleProgressSink {
    fn on_start(&self, snapshot: &BatchSnapshot) {
        eprintln!("{}", self.start_message(snapshot));
    }

    fn on_tick(&self, snapshot: &BatchSnapshot) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{}", status_line(snapshot));
        let _ = stderr.flush();
    }

    fn on_job_finished(&self, outcome: &JobOutcome) {
        eprintln!("\r{}: {}", outcome.file_name, outcome.status());
    }

    fn on_finish(&self, report: &BatchReport) {
        let failed = report.failures().count();
        if report.cancelled {
            eprintln!("Cancelled. {} of {} job(s) failed", failed, report.outcomes.len());
        } else if failed == 0 {
            eprintln!("Done. All {} job(s) succeeded", report.outcomes.len());
        } else {
            eprintln!("Done. {} of {} job(s) failed", failed, report.outcomes.len());
        }
    }
}

/// One JSON event per line on stdout
pub struct JsonProgressSink;

impl ProgressSink for JsonProgressSink {
    fn on_start(&self, snapshot: &BatchSnapshot) {
        let event = serde_json::json!({
            "event": "start",
            "jobs": snapshot.jobs,
            "total": snapshot.total,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_tick(&self, snapshot: &BatchSnapshot) {
        let event = serde_json::json!({
            "event": "progress",
            "aggregate": snapshot.aggregate,
            "total": snapshot.total,
            "percent": snapshot.percent(),
            "jobs": snapshot.jobs,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_job_finished(&self, outcome: &JobOutcome) {
        let event = serde_json::json!({
            "event": "job_finished",
            "outcome": outcome,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }

    fn on_finish(&self, report: &BatchReport) {
        let event = serde_json::json!({
            "event": "finish",
            "report": report,
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        println!("{}", event);
    }
}

/// Discards every event
pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn on_start(&self, _snapshot: &BatchSnapshot) {}
    fn on_tick(&self, _snapshot: &BatchSnapshot) {}
    fn on_job_finished(&self, _outcome: &JobOutcome) {}
    fn on_finish(&self, _report: &BatchReport) {}
}

/// `[####----------------]  20.0%` style bar
pub fn render_bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64) as usize;
    format!(
        "[{}{}] {:>5.1}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Aggregate bar followed by each running job's percentage
pub fn status_line(snapshot: &BatchSnapshot) -> String {
    let mut line = render_bar(snapshot.percent());
    for job in snapshot.jobs.iter().filter(|j| j.state == JobState::Running) {
        line.push_str(&format!(" | {} {:.1}%", short_name(&job.file_name), job.percent()));
    }
    line
}

fn short_name(file_name: &str) -> &str {
    std::path::Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name)
}
