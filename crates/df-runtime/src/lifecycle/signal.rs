use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use df_core::events::{PipelineEvent, Severity};
use df_core::monitor::EventSink;

/// Wait for Ctrl-C (SIGINT) or SIGTERM, report the shutdown request to the
/// bookkeeper, and cancel the pipeline.
pub async fn wait_for_signal(cancel: CancellationToken, sink: Arc<dyn EventSink>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to listen for SIGTERM");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                df_info!(sys, signal = "SIGINT", "received signal, initiating graceful shutdown");
            }
            _ = sigterm.recv() => {
                df_info!(sys, signal = "SIGTERM", "received signal, initiating graceful shutdown");
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for Ctrl-C");
        df_info!(sys, "received shutdown signal, initiating graceful shutdown");
    }

    sink.send_event(PipelineEvent::ShutdownRequest, Severity::Info, "")
        .await;
    cancel.cancel();
}
