use std::path::PathBuf;

use serde::Deserialize;

/// The six filesystem zones the pipeline moves series through.
///
/// All six must be configured; they are expected to live on one shared
/// filesystem so folder moves are plain renames.
#[derive(Debug, Clone, Deserialize)]
pub struct FoldersConfig {
    pub incoming: PathBuf,
    pub outgoing: PathBuf,
    pub success: PathBuf,
    pub error: PathBuf,
    pub discard: PathBuf,
    pub processing: PathBuf,
}

impl FoldersConfig {
    /// All folders in a fixed order, for validation sweeps.
    pub fn all(&self) -> [(&'static str, &PathBuf); 6] {
        [
            ("incoming", &self.incoming),
            ("outgoing", &self.outgoing),
            ("success", &self.success),
            ("error", &self.error),
            ("discard", &self.discard),
            ("processing", &self.processing),
        ]
    }
}
