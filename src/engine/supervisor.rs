//! Lifecycle of one transcode process

use std::ffi::OsStr;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::TranscodeConfig;
use crate::domain::model::Container;
use crate::engine::{JobOutcome, JobState, ProgressReport};
use crate::error::{ReelError, ReelResult};
use crate::planner::CommandBuilder;

/// Upper bound on waiting for stderr after exit; a surviving grandchild can
/// hold the pipe open.
const DIAGNOSTIC_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Owns one container's transcode run.
///
/// `NotStarted -> Running -> {Completed, Failed}`. The first [`progress`]
/// call after the process exits moves the job to its terminal state and
/// returns [`ReelError::ProgressFinished`] with the outcome. Later calls
/// return the container's full duration.
///
/// [`progress`]: JobSupervisor::progress
#[derive(Debug)]
pub struct JobSupervisor {
    container: Container,
    report: ProgressReport,
    state: JobState,
    child: Option<Child>,
    stderr_task: Option<JoinHandle<String>>,
    last_progress: u64,
    outcome: Option<JobOutcome>,
}

impl JobSupervisor {
    /// Prepare a job and its private progress report
    pub fn new(container: Container, config: &TranscodeConfig) -> ReelResult<Self> {
        Ok(Self {
            container,
            report: ProgressReport::new(config.report_tail_bytes)?,
            state: JobState::NotStarted,
            child: None,
            stderr_task: None,
            last_progress: 0,
            outcome: None,
        })
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Side-channel file the process writes progress into
    pub fn report_path(&self) -> &Path {
        self.report.path()
    }

    /// Total progress in microseconds
    pub fn total(&self) -> u64 {
        self.container.microseconds()
    }

    /// Most recent progress value handed out
    pub fn last_progress(&self) -> u64 {
        self.last_progress
    }

    /// Set once the job reaches a terminal state
    pub fn outcome(&self) -> Option<&JobOutcome> {
        self.outcome.as_ref()
    }

    /// Build the ffmpeg command for this job, program first
    pub fn command(&mut self, config: &TranscodeConfig) -> Vec<String> {
        CommandBuilder::new(config).build(&mut self.container, self.report.path())
    }

    /// Build the ffmpeg command and start it
    pub fn launch(&mut self, config: &TranscodeConfig) -> ReelResult<()> {
        let args = self.command(config);
        let (program, rest) = args.split_first().ok_or_else(|| ReelError::Launch {
            message: "empty command".to_string(),
        })?;
        self.spawn(program, rest)
    }

    /// Start an arbitrary program as this job's process.
    ///
    /// The program is expected to write progress into [`report_path`].
    /// A spawn failure ends the job as `Failed`.
    ///
    /// [`report_path`]: JobSupervisor::report_path
    pub fn spawn<P, S>(&mut self, program: P, args: &[S]) -> ReelResult<()>
    where
        P: AsRef<OsStr>,
        S: AsRef<OsStr>,
    {
        if self.state != JobState::NotStarted {
            return Err(ReelError::Launch {
                message: format!("{} was already launched", self.file_label()),
            });
        }

        let program = program.as_ref();
        let spawned = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                let message = format!("failed to spawn {}: {}", program.to_string_lossy(), e);
                warn!("{}: {}", self.file_label(), message);
                self.state = JobState::Failed;
                self.last_progress = self.total();
                self.outcome = Some(JobOutcome {
                    file_name: self.file_label(),
                    exit_code: None,
                    success: false,
                    cancelled: false,
                    diagnostics: message.clone(),
                });
                return Err(ReelError::Launch { message });
            }
        };

        self.stderr_task = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buffer = Vec::new();
                let _ = stderr.read_to_end(&mut buffer).await;
                String::from_utf8_lossy(&buffer).into_owned()
            })
        });
        self.child = Some(child);
        self.state = JobState::Running;
        info!("Launched transcode for {}", self.file_label());
        Ok(())
    }

    /// Current progress in microseconds.
    ///
    /// Returns 0 before launch. While running, returns the latest reported
    /// output time, never less than a previous value and never more than the
    /// container duration.
    pub async fn progress(&mut self) -> ReelResult<u64> {
        match self.state {
            JobState::NotStarted => return Ok(0),
            JobState::Completed | JobState::Failed => return Ok(self.total()),
            JobState::Running => {}
        }

        let exited = match self.child.as_mut() {
            Some(child) => child.try_wait()?,
            None => None,
        };
        if let Some(status) = exited {
            let outcome = self.finish(Some(status), false).await;
            return Err(ReelError::ProgressFinished(outcome));
        }

        let reported = self.report.latest_out_time()?.unwrap_or(0);
        self.last_progress = self.last_progress.max(reported).min(self.total());
        debug!("{}: {} / {} us", self.file_label(), self.last_progress, self.total());
        Ok(self.last_progress)
    }

    /// Kill the process and end the job as cancelled.
    ///
    /// A job that already ended keeps its outcome.
    pub async fn cancel(&mut self) -> JobOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }

        let label = self.file_label();
        let status = match self.child.as_mut() {
            Some(child) => {
                if let Err(e) = child.start_kill() {
                    debug!("{}: kill failed: {}", label, e);
                }
                child.wait().await.ok()
            }
            None => None,
        };
        info!("Cancelled transcode for {}", label);
        self.finish(status, true).await
    }

    async fn finish(&mut self, status: Option<ExitStatus>, cancelled: bool) -> JobOutcome {
        self.child = None;
        let diagnostics = match self.stderr_task.take() {
            Some(task) => {
                let abort = task.abort_handle();
                match tokio::time::timeout(DIAGNOSTIC_DRAIN_TIMEOUT, task).await {
                    Ok(Ok(text)) => text,
                    _ => {
                        abort.abort();
                        String::new()
                    }
                }
            }
            None => String::new(),
        };

        let success = !cancelled && status.map_or(false, |s| s.success());
        self.state = if success {
            JobState::Completed
        } else {
            JobState::Failed
        };
        self.last_progress = self.total();

        let outcome = JobOutcome {
            file_name: self.file_label(),
            exit_code: status.and_then(|s| s.code()),
            success,
            cancelled,
            diagnostics,
        };
        if success {
            info!("Transcode finished for {}", outcome.file_name);
        } else {
            warn!("Transcode failed for {} ({})", outcome.file_name, outcome.status());
        }
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn file_label(&self) -> String {
        self.container.file_name().display().to_string()
    }
}
