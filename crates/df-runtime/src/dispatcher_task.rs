use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use df_config::FlowConfig;
use df_core::clock::Clock;
use df_core::dispatch::{self, DispatchContext};
use df_core::events::{PipelineEvent, Severity};
use df_core::monitor::EventSink;

/// Periodic dispatcher driver with its bounded transfer worker pool.
///
/// Each tick claims eligible outgoing folders and spawns one worker task
/// per claimed folder; workers run truly in parallel, bounded by the
/// semaphore. On shutdown the driver stops claiming but lets every
/// in-flight transfer run to completion — no forced kill.
#[tracing::instrument(name = "dispatcher", skip_all)]
pub(crate) async fn run_dispatcher(
    config_path: PathBuf,
    interval: Duration,
    worker_parallelism: usize,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
) {
    let semaphore = Arc::new(Semaphore::new(worker_parallelism));
    let mut workers: JoinSet<()> = JoinSet::new();
    let mut tick = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = tick.tick() => {
                run_once(&config_path, &sink, &clock, &cancel, &semaphore, &mut workers).await;
            }
            Some(result) = workers.join_next(), if !workers.is_empty() => {
                report_worker_result(result, &sink).await;
            }
            _ = cancel.cancelled() => break,
        }
    }

    // Drain: in-flight transfers are allowed to complete.
    while let Some(result) = workers.join_next().await {
        report_worker_result(result, &sink).await;
    }
    df_info!(disp, "dispatcher stopped");
}

async fn run_once(
    config_path: &PathBuf,
    sink: &Arc<dyn EventSink>,
    clock: &Arc<dyn Clock>,
    cancel: &CancellationToken,
    semaphore: &Arc<Semaphore>,
    workers: &mut JoinSet<()>,
) {
    let config = match FlowConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            df_warn!(conf, error = %e, "unable to read configuration, skipping tick");
            sink.send_event(
                PipelineEvent::ConfigUpdate,
                Severity::Warning,
                "Unable to read configuration",
            )
            .await;
            return;
        }
    };

    let ctx = DispatchContext::from_config(&config);
    let jobs = dispatch::scan_outgoing(&config, sink.as_ref(), clock.as_ref(), cancel).await;

    for job in jobs {
        let ctx = ctx.clone();
        let sink = sink.clone();
        let clock = clock.clone();
        let semaphore = semaphore.clone();
        workers.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
            dispatch::execute(&job, &ctx, sink.as_ref(), clock.as_ref()).await;
        });
    }
}

/// Worker boundary: a panicking worker must not vanish silently — the
/// folder it claimed stays `.SENDING` until an operator intervenes, so the
/// failure is both logged and reported.
async fn report_worker_result(
    result: Result<(), tokio::task::JoinError>,
    sink: &Arc<dyn EventSink>,
) {
    if let Err(e) = result {
        df_error!(disp, error = %e, "transfer worker failed");
        sink.send_event(
            PipelineEvent::Processing,
            Severity::Error,
            &format!("Transfer worker failed: {e}"),
        )
        .await;
    }
}
