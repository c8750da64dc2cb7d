use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use df_config::FlowConfig;
use df_core::events::{PipelineEvent, Severity};
use df_core::monitor::EventSink;
use df_core::notify::Notifier;
use df_core::router::Router;
use df_core::{quarantine, series};

/// Periodic router driver: every tick, route whatever is in incoming/ and
/// sweep error markers.
#[tracing::instrument(name = "router", skip_all)]
pub(crate) async fn run_router(
    config_path: PathBuf,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
) {
    let mut tick = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                run_once(&config_path, &sink, &notifier, &cancel).await;
            }
            _ = cancel.cancelled() => break,
        }
    }
    df_info!(route, "router stopped");
}

/// One router tick. Configuration is read at tick start and never mid-tick,
/// so rule evaluation stays consistent within one series; a read failure
/// skips the whole tick.
async fn run_once(
    config_path: &PathBuf,
    sink: &Arc<dyn EventSink>,
    notifier: &Arc<dyn Notifier>,
    cancel: &CancellationToken,
) {
    let config = match FlowConfig::load(config_path) {
        Ok(config) => Arc::new(config),
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

    let uids = match series::collect_series_uids(&config.folders.incoming) {
        Ok(uids) => uids,
        Err(e) => {
            df_warn!(route, error = %e, "unable to scan incoming folder");
            return;
        }
    };

    if !uids.is_empty() {
        df_debug!(route, series = uids.len(), "router tick");
    }

    let router = Router::new(config.clone(), sink.clone(), notifier.clone());
    for uid in uids {
        // Stop between series when shutdown was requested; the series in
        // flight always completes.
        if cancel.is_cancelled() {
            return;
        }
        router.route_series(&uid).await;
    }

    quarantine::route_error_files(&config, sink.as_ref()).await;
}
