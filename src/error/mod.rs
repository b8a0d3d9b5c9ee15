//! Error handling module for Reelcast

use thiserror::Error;

use crate::engine::JobOutcome;

/// Main error type for Reelcast operations
#[derive(Error, Debug)]
pub enum ReelError {
    /// Probe succeeded but the document has no usable duration
    #[error("Unusable probe data for {file_name}: {message}")]
    ProbeData { file_name: String, message: String },

    /// The probing call itself failed
    #[error("Failed to probe {file_name}: {message}")]
    ProbeInvocation { file_name: String, message: String },

    /// Invalid stream selection or per-stream parameter
    #[error("Invalid selection: {message}")]
    Selection { message: String },

    /// The transcoder process has exited. Raised exactly once per job.
    #[error("Transcode process for {} finished", .0.file_name)]
    ProgressFinished(JobOutcome),

    /// Configuration could not be loaded or is out of range
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External subtitle file could not be attached
    #[error("Subtitle file {file_name}: {message}")]
    Subtitle { file_name: String, message: String },

    /// Transcoder process could not be started
    #[error("Failed to launch transcoder: {message}")]
    Launch { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ReelError {
    /// Shorthand for a selection error
    pub fn selection(message: impl Into<String>) -> Self {
        ReelError::Selection {
            message: message.into(),
        }
    }

    /// Shorthand for a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        ReelError::Config {
            message: message.into(),
        }
    }
}

/// Result type alias for Reelcast operations
pub type ReelResult<T> = std::result::Result<T, ReelError>;
