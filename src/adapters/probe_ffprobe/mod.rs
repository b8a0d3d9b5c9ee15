//! FFprobe adapter for media file probing
//!
//! Runs `ffprobe -show_format -show_streams` with JSON output and parses it
//! into a [`ProbeDocument`].

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{ReelError, ReelResult};
use crate::ports::ProbePort;
use crate::probe::ProbeDocument;

/// FFprobe-based probe adapter
#[derive(Debug, Clone)]
pub struct FfprobeAdapter {
    ffprobe_path: PathBuf,
}

impl FfprobeAdapter {
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Arguments passed before the file name
    pub fn base_args() -> [&'static str; 6] {
        ["-v", "error", "-show_format", "-show_streams", "-of", "json"]
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, file_path: &Path) -> ReelResult<ProbeDocument> {
        let file_name = file_path.display().to_string();
        let invocation_error = |message: String| ReelError::ProbeInvocation {
            file_name: file_name.clone(),
            message,
        };

        debug!("Probing {} with {}", file_name, self.ffprobe_path.display());
        let output = Command::new(&self.ffprobe_path)
            .args(Self::base_args())
            .arg(file_path)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                invocation_error(format!(
                    "failed to run {}: {}",
                    self.ffprobe_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(invocation_error(stderr));
        }

        let mut document = ProbeDocument::from_json(&String::from_utf8_lossy(&output.stdout))
            .map_err(|e| invocation_error(format!("invalid ffprobe output: {}", e)))?;
        if document.format.filename.is_empty() {
            document.format.filename = file_name.clone();
        }
        Ok(document)
    }
}
