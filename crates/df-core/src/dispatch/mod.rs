mod scan;
mod send;
mod status;


pub use scan::scan_outgoing;
pub use send::{TransferFailure, execute, move_folder};
pub use status::{has_been_sent, is_ready_for_sending};

use std::path::PathBuf;
use std::time::Duration;

use df_config::FlowConfig;

use crate::task::TaskDescriptor;

/// One claimed outgoing folder, ready for a transfer worker.
#[derive(Debug)]
pub struct TransferJob {
    pub task: TaskDescriptor,
    pub folder: PathBuf,
}

/// Everything a transfer worker needs besides the job itself. Rebuilt per
/// dispatcher tick from the freshly loaded configuration.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub success_folder: PathBuf,
    pub error_folder: PathBuf,
    pub retry_max: u32,
    pub retry_delay: Duration,
    pub send_command: PathBuf,
}

impl DispatchContext {
    pub fn from_config(config: &FlowConfig) -> Self {
        Self {
            success_folder: config.folders.success.clone(),
            error_folder: config.folders.error.clone(),
            retry_max: config.dispatch.retry_max,
            retry_delay: config.dispatch.retry_delay.as_duration(),
            send_command: config.dispatch.send_command.clone(),
        }
    }
}
