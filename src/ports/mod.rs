// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::error::ReelResult;
use crate::probe::ProbeDocument;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe a media file into a structured document.
    ///
    /// Fails with `ProbeInvocation` when the prober cannot run, exits
    /// nonzero, or prints something unparsable.
    async fn probe(&self, file_path: &Path) -> ReelResult<ProbeDocument>;
}
