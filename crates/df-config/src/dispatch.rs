use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::HumanDuration;

/// Dispatch and retry tuning from `[dispatch]`. The whole section may be
/// omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Failed transfer attempts before a folder is suspended to error/.
    pub retry_max: u32,
    /// Delay added to `next_retry_at` after a failed attempt.
    pub retry_delay: HumanDuration,
    /// Dispatcher tick period.
    pub scan_interval: HumanDuration,
    /// Router tick period.
    pub router_scan_interval: HumanDuration,
    /// Upper bound on concurrently running transfer commands.
    pub worker_parallelism: usize,
    /// External DICOM transfer binary. Overridable so tests can stub the
    /// exit code contract.
    pub send_command: PathBuf,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            retry_max: 5,
            retry_delay: Duration::from_secs(60).into(),
            scan_interval: Duration::from_secs(1).into(),
            router_scan_interval: Duration::from_secs(1).into(),
            worker_parallelism: 4,
            send_command: PathBuf::from("dcmsend"),
        }
    }
}
