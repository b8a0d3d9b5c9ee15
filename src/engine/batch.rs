//! Concurrent supervision of a batch of transcode jobs

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TranscodeConfig;
use crate::domain::model::Container;
use crate::engine::{percent, JobOutcome, JobState, JobSupervisor, ProgressSink};
use crate::error::{ReelError, ReelResult};

/// Progress of one job at a tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobProgress {
    pub file_name: String,
    /// Microseconds
    pub current: u64,
    /// Microseconds
    pub total: u64,
    pub state: JobState,
}

impl JobProgress {
    pub fn percent(&self) -> f64 {
        percent(self.current, self.total)
    }
}

/// State of the whole batch after one poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSnapshot {
    pub jobs: Vec<JobProgress>,
    /// Sum of per-job progress, bounded by `total`
    pub aggregate: u64,
    pub total: u64,
    /// Jobs that ended during this poll
    pub finished: Vec<JobOutcome>,
}

impl BatchSnapshot {
    pub fn percent(&self) -> f64 {
        percent(self.aggregate, self.total)
    }
}

/// Result of a whole batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// One outcome per job, in batch order
    pub outcomes: Vec<JobOutcome>,
    pub cancelled: bool,
    pub aggregate: u64,
    pub total: u64,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    pub fn all_succeeded(&self) -> bool {
        !self.cancelled && self.outcomes.iter().all(|o| o.success)
    }
}

/// Runs every job of a batch and sums their progress.
///
/// A job that ends, successfully or not, counts as its full duration and
/// leaves the active set. One job failing never stops the others.
#[derive(Debug)]
pub struct BatchCoordinator {
    jobs: Vec<JobSupervisor>,
    progress: Vec<u64>,
    outcomes: Vec<Option<JobOutcome>>,
    active: Vec<usize>,
    config: TranscodeConfig,
}

impl BatchCoordinator {
    /// Wrap prepared jobs. Jobs already running are picked up as active.
    pub fn new(jobs: Vec<JobSupervisor>, config: TranscodeConfig) -> Self {
        let mut coordinator = Self {
            progress: vec![0; jobs.len()],
            outcomes: vec![None; jobs.len()],
            active: Vec::new(),
            jobs,
            config,
        };
        for i in 0..coordinator.jobs.len() {
            coordinator.track(i);
        }
        coordinator
    }

    /// One job per container
    pub fn from_containers(containers: Vec<Container>, config: TranscodeConfig) -> ReelResult<Self> {
        let jobs = containers
            .into_iter()
            .map(|container| JobSupervisor::new(container, &config))
            .collect::<ReelResult<Vec<_>>>()?;
        Ok(Self::new(jobs, config))
    }

    pub fn jobs(&self) -> &[JobSupervisor] {
        &self.jobs
    }

    /// Sum of all container durations in microseconds
    pub fn total(&self) -> u64 {
        self.jobs.iter().map(JobSupervisor::total).sum()
    }

    pub fn aggregate(&self) -> u64 {
        self.progress.iter().sum::<u64>().min(self.total())
    }

    /// No job is left running
    pub fn is_finished(&self) -> bool {
        self.active.is_empty()
    }

    /// Launch every job that has not started yet.
    ///
    /// Returns the outcomes of jobs that could not be spawned; those jobs
    /// are already counted as finished.
    pub fn launch_all(&mut self) -> Vec<JobOutcome> {
        let mut failed = Vec::new();
        for i in 0..self.jobs.len() {
            if self.jobs[i].state() != JobState::NotStarted {
                continue;
            }
            if let Err(e) = self.jobs[i].launch(&self.config) {
                warn!("{}", e);
            }
            self.track(i);
            if let Some(outcome) = self.jobs[i].outcome() {
                failed.push(outcome.clone());
            }
        }
        failed
    }

    /// Poll every active job once
    pub async fn poll_once(&mut self) -> BatchSnapshot {
        let mut still_active = Vec::with_capacity(self.active.len());
        let mut finished = Vec::new();

        for &i in &self.active {
            match self.jobs[i].progress().await {
                Ok(value) => {
                    self.progress[i] = value;
                    still_active.push(i);
                }
                Err(ReelError::ProgressFinished(outcome)) => {
                    self.progress[i] = self.jobs[i].total();
                    self.outcomes[i] = Some(outcome.clone());
                    finished.push(outcome);
                }
                Err(e) => {
                    debug!("Progress read failed, retrying next tick: {}", e);
                    still_active.push(i);
                }
            }
        }
        self.active = still_active;

        BatchSnapshot {
            jobs: self.job_progress(),
            aggregate: self.aggregate(),
            total: self.total(),
            finished,
        }
    }

    /// Cancel every job still running
    pub async fn cancel_all(&mut self) -> Vec<JobOutcome> {
        let mut cancelled = Vec::new();
        for i in std::mem::take(&mut self.active) {
            let outcome = self.jobs[i].cancel().await;
            self.progress[i] = self.jobs[i].total();
            self.outcomes[i] = Some(outcome.clone());
            cancelled.push(outcome);
        }
        cancelled
    }

    /// Launch all jobs and poll them every tick until they all end or
    /// `cancel` resolves.
    pub async fn run<F>(mut self, sink: &dyn ProgressSink, cancel: F) -> BatchReport
    where
        F: Future<Output = ()>,
    {
        let launch_failures = self.launch_all();
        info!(
            "Running {} transcode job(s), {} failed to launch",
            self.jobs.len(),
            launch_failures.len()
        );
        sink.on_start(&self.snapshot());
        for outcome in &launch_failures {
            sink.on_job_finished(outcome);
        }

        tokio::pin!(cancel);
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        let mut cancelled = false;

        while !self.is_finished() {
            tokio::select! {
                _ = &mut cancel => {
                    warn!("Batch cancelled, stopping {} running job(s)", self.active.len());
                    for outcome in self.cancel_all().await {
                        sink.on_job_finished(&outcome);
                    }
                    cancelled = true;
                }
                _ = ticker.tick() => {
                    let snapshot = self.poll_once().await;
                    for outcome in &snapshot.finished {
                        sink.on_job_finished(outcome);
                    }
                    sink.on_tick(&snapshot);
                }
            }
        }

        let report = self.into_report(cancelled);
        info!(
            "Batch finished: {} ok, {} failed",
            report.outcomes.len() - report.failures().count(),
            report.failures().count()
        );
        sink.on_finish(&report);
        report
    }

    /// Current state without polling
    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            jobs: self.job_progress(),
            aggregate: self.aggregate(),
            total: self.total(),
            finished: Vec::new(),
        }
    }

    pub fn into_report(self, cancelled: bool) -> BatchReport {
        let aggregate = self.aggregate();
        let total = self.total();
        BatchReport {
            outcomes: self.outcomes.into_iter().flatten().collect(),
            cancelled,
            aggregate,
            total,
        }
    }

    /// Start counting a job according to its state
    fn track(&mut self, i: usize) {
        let job = &self.jobs[i];
        match job.state() {
            JobState::Running => {
                if !self.active.contains(&i) {
                    self.active.push(i);
                }
            }
            JobState::Completed | JobState::Failed => {
                self.progress[i] = job.total();
                self.outcomes[i] = job.outcome().cloned();
            }
            JobState::NotStarted => {}
        }
    }

    fn job_progress(&self) -> Vec<JobProgress> {
        self.jobs
            .iter()
            .zip(&self.progress)
            .map(|(job, current)| JobProgress {
                file_name: job.container().file_name().display().to_string(),
                current: *current,
                total: job.total(),
                state: job.state(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Stream, StreamKind};
    use crate::engine::NoOpProgressSink;

    fn container(name: &str, seconds: f64, config: &TranscodeConfig) -> Container {
        let streams = vec![Stream::new(0, StreamKind::Audio, "aac")];
        Container::new(name, seconds, streams, config).unwrap()
    }

    fn missing_ffmpeg() -> TranscodeConfig {
        TranscodeConfig {
            ffmpeg_path: "/nonexistent/reelcast-ffmpeg".into(),
            poll_interval_ms: 10,
            ..TranscodeConfig::default()
        }
    }

    #[test]
    fn test_total_sums_durations() {
        let config = TranscodeConfig::default();
        let coordinator = BatchCoordinator::from_containers(
            vec![container("a.mkv", 1.0, &config), container("b.mkv", 2.5, &config)],
            config,
        )
        .unwrap();
        assert_eq!(coordinator.total(), 3_500_000);
        assert_eq!(coordinator.aggregate(), 0);
        assert!(coordinator.is_finished());
    }

    #[tokio::test]
    async fn test_launch_failures_count_as_finished() {
        let config = missing_ffmpeg();
        let containers = vec![container("a.mkv", 1.0, &config), container("b.mkv", 2.0, &config)];
        let mut coordinator = BatchCoordinator::from_containers(containers, config).unwrap();

        let failed = coordinator.launch_all();
        assert_eq!(failed.len(), 2);
        assert!(coordinator.is_finished());
        assert_eq!(coordinator.aggregate(), coordinator.total());
    }

    #[tokio::test]
    async fn test_run_reports_every_job() {
        let config = missing_ffmpeg();
        let containers = vec![container("a.mkv", 1.0, &config)];
        let coordinator = BatchCoordinator::from_containers(containers, config).unwrap();

        let report = coordinator
            .run(&NoOpProgressSink, std::future::pending::<()>())
            .await;
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.aggregate, report.total);
        assert!(!report.cancelled);
    }
}
