//! Reelcast Library
//!
//! Batch media transcoding: probe files into containers, pick the streams to
//! keep, plan one ffmpeg command per file that copies what already matches
//! the target codecs and transcodes the rest, then run every command
//! concurrently while polling each process's progress report.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod config_initialization;
pub mod domain;
pub mod engine;
pub mod error;
pub mod planner;
pub mod ports;
pub mod probe;
pub mod utils;

// Re-export commonly used types
pub use config::TranscodeConfig;
pub use domain::model::{Container, Stream, StreamKind, StreamLabel, SubtitleFile};
pub use engine::{BatchCoordinator, BatchReport, JobOutcome, JobState, JobSupervisor};
pub use error::{ReelError, ReelResult};
pub use planner::CommandBuilder;
