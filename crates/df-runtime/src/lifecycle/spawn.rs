use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use df_core::clock::Clock;
use df_core::monitor::EventSink;
use df_core::notify::Notifier;

use crate::dispatcher_task::run_dispatcher;
use crate::router_task::run_router;

use super::types::TaskGroup;

pub(super) fn spawn_router_task(
    config_path: PathBuf,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
) -> TaskGroup {
    let mut group = TaskGroup::new("router");
    group.push(tokio::spawn(async move {
        run_router(config_path, interval, sink, notifier, cancel).await;
        Ok(())
    }));
    group
}

pub(super) fn spawn_dispatcher_task(
    config_path: PathBuf,
    interval: Duration,
    worker_parallelism: usize,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) -> TaskGroup {
    let mut group = TaskGroup::new("dispatcher");
    group.push(tokio::spawn(async move {
        run_dispatcher(
            config_path,
            interval,
            worker_parallelism,
            sink,
            clock,
            cancel,
        )
        .await;
        Ok(())
    }));
    group
}
