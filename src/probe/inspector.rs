//! Probe files into containers

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::TranscodeConfig;
use crate::domain::model::Container;
use crate::error::ReelResult;
use crate::ports::ProbePort;

/// A file that could not be turned into a container
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub file_name: PathBuf,
    pub message: String,
}

/// Containers built from a list of files, plus the files that failed
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Inspection {
    /// Sorted by file name
    pub containers: Vec<Container>,
    pub failures: Vec<ProbeFailure>,
}

impl Inspection {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Turns media files into containers through a probe port
pub struct ContainerInspector<P: ProbePort> {
    probe: P,
    config: TranscodeConfig,
}

impl<P: ProbePort> ContainerInspector<P> {
    pub fn new(probe: P, config: TranscodeConfig) -> Self {
        Self { probe, config }
    }

    /// Probe and build a single container
    pub async fn inspect(&self, file: &Path) -> ReelResult<Container> {
        let document = self.probe.probe(file).await?;
        Container::from_probe(&document, &self.config)
    }

    /// Probe every file. A failing file is recorded and skipped.
    pub async fn build_containers(&self, files: &[PathBuf]) -> Inspection {
        let mut inspection = Inspection::default();
        for file in files {
            match self.inspect(file).await {
                Ok(container) => inspection.containers.push(container),
                Err(e) => {
                    warn!("Skipping {}: {}", file.display(), e);
                    inspection.failures.push(ProbeFailure {
                        file_name: file.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        inspection
            .containers
            .sort_by(|a, b| a.file_name().cmp(b.file_name()));
        info!(
            "Probed {} file(s): {} usable, {} failed",
            files.len(),
            inspection.containers.len(),
            inspection.failures.len()
        );
        inspection
    }
}
