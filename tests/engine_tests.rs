//! Supervisor and coordinator behaviour against real short-lived processes

#![cfg(unix)]

use std::sync::Mutex;
use std::time::{Duration, Instant};

use reelcast::engine::{
    BatchCoordinator, BatchReport, BatchSnapshot, JobOutcome, JobState, JobSupervisor,
    NoOpProgressSink, ProgressSink,
};
use reelcast::{Container, ReelError, Stream, StreamKind, TranscodeConfig};

const POLL: Duration = Duration::from_millis(20);
const MAX_POLLS: usize = 1000;

fn config() -> TranscodeConfig {
    TranscodeConfig {
        poll_interval_ms: 20,
        ..TranscodeConfig::default()
    }
}

fn job(name: &str, seconds: f64) -> JobSupervisor {
    let config = config();
    let streams = vec![Stream::new(0, StreamKind::Audio, "aac")];
    let container = Container::new(name, seconds, streams, &config).unwrap();
    JobSupervisor::new(container, &config).unwrap()
}

/// Run `script` under sh with the report path as `$1`
fn start(job: &mut JobSupervisor, script: &str) {
    let report = job.report_path().display().to_string();
    job.spawn("sh", &["-c", script, "sh", report.as_str()])
        .unwrap();
}

/// Poll until the job signals it finished
async fn drive(job: &mut JobSupervisor) -> (Vec<u64>, JobOutcome) {
    let mut values = Vec::new();
    for _ in 0..MAX_POLLS {
        match job.progress().await {
            Ok(value) => values.push(value),
            Err(ReelError::ProgressFinished(outcome)) => return (values, outcome),
            Err(e) => panic!("unexpected error: {}", e),
        }
        tokio::time::sleep(POLL).await;
    }
    panic!("job did not finish");
}

#[tokio::test]
async fn test_progress_is_monotonic_and_finishes_once() {
    let mut job = job("a.mkv", 2.0);
    start(
        &mut job,
        r#"printf 'out_time_ms=500000\nprogress=continue\n' >> "$1"; sleep 0.2
printf 'out_time_ms=1500000\nprogress=continue\n' >> "$1"; sleep 0.2
: > "$1"; printf 'out_time_ms=200000\nprogress=continue\n' >> "$1"; sleep 0.2"#,
    );
    assert_eq!(job.state(), JobState::Running);

    let (values, outcome) = drive(&mut job).await;
    assert!(values.windows(2).all(|w| w[0] <= w[1]), "{:?}", values);
    assert!(values.iter().all(|v| *v <= 2_000_000));
    assert!(values.contains(&1_500_000), "{:?}", values);

    assert!(outcome.success);
    assert_eq!(outcome.exit_code, Some(0));
    assert_eq!(outcome.file_name, "a.mkv");
    assert_eq!(job.state(), JobState::Completed);

    assert_eq!(job.progress().await.unwrap(), 2_000_000);
    assert_eq!(job.progress().await.unwrap(), 2_000_000);
}

#[tokio::test]
async fn test_nonzero_exit_carries_diagnostics() {
    let mut job = job("broken.mkv", 5.0);
    start(&mut job, r#"echo "Conversion failed!" >&2; exit 3"#);

    let (_, outcome) = drive(&mut job).await;
    assert!(!outcome.success);
    assert!(!outcome.cancelled);
    assert_eq!(outcome.exit_code, Some(3));
    assert!(outcome.diagnostics.contains("Conversion failed!"));
    assert_eq!(job.state(), JobState::Failed);
    assert_eq!(job.outcome(), Some(&outcome));

    // No second notification
    assert_eq!(job.progress().await.unwrap(), 5_000_000);
}

#[tokio::test]
async fn test_running_progress_is_clamped_to_duration() {
    let mut job = job("a.mkv", 1.0);
    start(
        &mut job,
        r#"printf 'out_time_ms=99000000\nprogress=continue\n' >> "$1"; sleep 1"#,
    );

    let mut seen = 0;
    for _ in 0..MAX_POLLS {
        seen = job.progress().await.unwrap();
        if seen > 0 {
            break;
        }
        tokio::time::sleep(POLL).await;
    }
    assert_eq!(seen, 1_000_000);
    job.cancel().await;
}

#[tokio::test]
async fn test_relaunch_is_rejected() {
    let mut job = job("a.mkv", 1.0);
    start(&mut job, "exit 0");
    let result = job.spawn("sh", &["-c", "exit 0"]);
    assert!(matches!(result, Err(ReelError::Launch { .. })));
    drive(&mut job).await;
}

#[tokio::test]
async fn test_cancel_kills_process() {
    let mut job = job("long.mkv", 60.0);
    start(&mut job, "exec sleep 30");

    let started = Instant::now();
    let outcome = job.cancel().await;
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(outcome.cancelled);
    assert!(!outcome.success);
    assert_eq!(job.state(), JobState::Failed);
    assert_eq!(job.progress().await.unwrap(), 60_000_000);
    assert_eq!(job.cancel().await, outcome);
}

#[tokio::test]
async fn test_coordinator_isolates_failures() {
    let mut ok = job("ok.mkv", 1.0);
    start(
        &mut ok,
        r#"printf 'out_time_ms=400000\nprogress=continue\n' >> "$1"; sleep 0.3
printf 'out_time_ms=1000000\nprogress=end\n' >> "$1""#,
    );
    let mut bad = job("bad.mkv", 2.0);
    start(&mut bad, r#"echo "Invalid data found" >&2; exit 1"#);
    let mut slow = job("slow.mkv", 3.0);
    start(&mut slow, r#"sleep 0.6; printf 'out_time_ms=3000000\n' >> "$1""#);

    let mut coordinator = BatchCoordinator::new(vec![ok, bad, slow], config());
    assert_eq!(coordinator.total(), 6_000_000);

    let mut last_aggregate = 0;
    let mut finished: Vec<JobOutcome> = Vec::new();
    for _ in 0..MAX_POLLS {
        if coordinator.is_finished() {
            break;
        }
        let snapshot = coordinator.poll_once().await;
        assert!(snapshot.aggregate <= snapshot.total);
        assert!(snapshot.aggregate >= last_aggregate);
        last_aggregate = snapshot.aggregate;
        finished.extend(snapshot.finished);
        tokio::time::sleep(POLL).await;
    }

    assert!(coordinator.is_finished());
    assert_eq!(coordinator.aggregate(), 6_000_000);
    assert_eq!(finished.len(), 3);

    let bad = finished.iter().find(|o| o.file_name == "bad.mkv").unwrap();
    assert!(!bad.success);
    assert!(bad.diagnostics.contains("Invalid data found"));
    assert!(finished
        .iter()
        .filter(|o| o.file_name != "bad.mkv")
        .all(|o| o.success));

    let report = coordinator.into_report(false);
    let names: Vec<&str> = report.outcomes.iter().map(|o| o.file_name.as_str()).collect();
    assert_eq!(names, vec!["ok.mkv", "bad.mkv", "slow.mkv"]);
    assert_eq!(report.failures().count(), 1);
    assert!(!report.all_succeeded());
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_start(&self, snapshot: &BatchSnapshot) {
        self.push(format!("start {}", snapshot.jobs.len()));
    }

    fn on_tick(&self, _snapshot: &BatchSnapshot) {
        self.push("tick".to_string());
    }

    fn on_job_finished(&self, outcome: &JobOutcome) {
        self.push(format!("finished {} {}", outcome.file_name, outcome.status()));
    }

    fn on_finish(&self, report: &BatchReport) {
        self.push(format!("finish {}", report.outcomes.len()));
    }
}

#[tokio::test]
async fn test_run_notifies_sink() {
    let mut a = job("a.mkv", 1.0);
    start(&mut a, "exit 0");
    let mut b = job("b.mkv", 1.0);
    start(&mut b, "sleep 0.1; exit 2");

    let sink = RecordingSink::default();
    let report = BatchCoordinator::new(vec![a, b], config())
        .run(&sink, std::future::pending::<()>())
        .await;

    assert!(!report.cancelled);
    assert_eq!(report.aggregate, report.total);
    assert_eq!(report.failures().count(), 1);

    let events = sink.events();
    assert_eq!(events.first().map(String::as_str), Some("start 2"));
    assert_eq!(events.last().map(String::as_str), Some("finish 2"));
    assert!(events.contains(&"finished a.mkv ok".to_string()));
    assert!(events.contains(&"finished b.mkv exit code 2".to_string()));
    assert!(events.iter().any(|e| e == "tick"));
}

#[tokio::test]
async fn test_run_cancellation_stops_every_job() {
    let mut jobs = Vec::new();
    for name in ["a.mkv", "b.mkv"] {
        let mut job = job(name, 10.0);
        start(&mut job, "exec sleep 30");
        jobs.push(job);
    }

    let started = Instant::now();
    let report = BatchCoordinator::new(jobs, config())
        .run(
            &NoOpProgressSink,
            tokio::time::sleep(Duration::from_millis(150)),
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.cancelled);
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.outcomes.iter().all(|o| o.cancelled));
    assert_eq!(report.aggregate, report.total);
    assert!(!report.all_succeeded());
}
