mod signal;
mod spawn;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use orion_error::op_context;
use orion_error::prelude::*;
use orion_error::ErrorOweBase;
use tokio_util::sync::CancellationToken;

use df_config::FlowConfig;
use df_core::clock::Clock;
use df_core::monitor::EventSink;
use df_core::notify::Notifier;

use crate::error::{RuntimeReason, RuntimeResult};

pub use signal::wait_for_signal;

use spawn::{spawn_dispatcher_task, spawn_router_task};
use types::TaskGroup;

// ---------------------------------------------------------------------------
// Pipeline — the top-level lifecycle handle
// ---------------------------------------------------------------------------

/// Manages the full lifecycle of the routing pipeline: bootstrap, run, and
/// graceful shutdown.
///
/// Task groups are stored in start order and joined in reverse (LIFO)
/// during [`wait`](Self::wait): the router stops first so nothing new lands
/// in outgoing/, then the dispatcher drains its in-flight transfers.
pub struct Pipeline {
    cancel: CancellationToken,
    groups: Vec<TaskGroup>,
}

impl Pipeline {
    /// Bootstrap the pipeline from a configuration file path.
    ///
    /// The configuration is loaded once here to fail fast on startup
    /// errors; afterwards both drivers re-read it at every tick, so edits
    /// take effect without a restart. The pipeline folders are created if
    /// missing.
    #[tracing::instrument(name = "pipeline.start", skip_all, fields(config = %config_path.display()))]
    pub async fn start(
        config_path: PathBuf,
        sink: Arc<dyn EventSink>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> RuntimeResult<Self> {
        let mut op = op_context!("pipeline-bootstrap").with_auto_log();
        op.record("config", config_path.display().to_string().as_str());

        let config = FlowConfig::load(&config_path).owe(RuntimeReason::Bootstrap)?;
        for (_, folder) in config.folders.all() {
            std::fs::create_dir_all(folder)
                .map_err(|e| {
                    StructError::from(RuntimeReason::Bootstrap)
                        .with_detail(format!("unable to create {}: {e}", folder.display()))
                })?;
        }
        df_info!(
            sys,
            rules = config.rules.len(),
            targets = config.targets.len(),
            "pipeline bootstrap complete"
        );

        let cancel = CancellationToken::new();
        let mut groups: Vec<TaskGroup> = Vec::with_capacity(2);

        // Start order: dispatcher → router; joined in reverse.
        groups.push(spawn_dispatcher_task(
            config_path.clone(),
            config.dispatch.scan_interval.as_duration(),
            config.dispatch.worker_parallelism,
            sink.clone(),
            clock,
            cancel.child_token(),
        ));
        groups.push(spawn_router_task(
            config_path,
            config.dispatch.router_scan_interval.as_duration(),
            sink,
            notifier,
            cancel.child_token(),
        ));

        op.mark_suc();
        Ok(Self { cancel, groups })
    }

    /// Request graceful shutdown of both drivers.
    pub fn shutdown(&self) {
        df_info!(sys, "initiating graceful shutdown");
        self.cancel.cancel();
    }

    /// Wait for all task groups after shutdown: router first, then the
    /// dispatcher with its in-flight transfers.
    pub async fn wait(mut self) -> RuntimeResult<()> {
        while let Some(group) = self.groups.pop() {
            let name = group.name;
            df_debug!(sys, task_group = name, "waiting for task group to finish");
            group.wait().await?;
            df_debug!(sys, task_group = name, "task group finished");
        }
        Ok(())
    }

    /// Clone of the root cancellation token, for signal integration.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
