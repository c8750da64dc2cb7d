use df_config::FlowConfig;
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::events::{PipelineEvent, Severity, SeriesEvent};
use crate::monitor::EventSink;
use crate::names;
use crate::task;

use super::send::move_folder;
use super::status::{has_been_sent, is_ready_for_sending};
use super::TransferJob;

/// One dispatcher tick over the outgoing folder.
///
/// Folders whose transfer already succeeded are moved to success/; eligible
/// folders are claimed with a `.SENDING` sentinel and returned as transfer
/// jobs for the worker pool. The scan never blocks on a transfer — it only
/// claims. Cancellation is honored between directory entries, so the entry
/// being handled always completes.
pub async fn scan_outgoing(
    config: &FlowConfig,
    sink: &dyn EventSink,
    clock: &dyn Clock,
    cancel: &CancellationToken,
) -> Vec<TransferJob> {
    let outgoing = &config.folders.outgoing;
    let entries = match std::fs::read_dir(outgoing) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("unable to scan {}: {e}", outgoing.display());
            return Vec::new();
        }
    };

    let mut jobs = Vec::new();

    for entry in entries.flatten() {
        if cancel.is_cancelled() {
            break;
        }
        let folder = entry.path();
        if !folder.is_dir() {
            continue;
        }

        if has_been_sent(&folder) {
            // Crash window between `.SENT` and the worker's move: finish the
            // move here.
            let series_uid = task::read_route_descriptor(&folder)
                .map(|t| t.series_uid_or_missing().to_string())
                .unwrap_or_else(|_| "series_uid-missing".to_string());
            if let Some(dest) = move_folder(&folder, &config.folders.success, clock, sink).await {
                log::info!("folder {} moved to success", folder.display());
                sink.send_series_event(
                    SeriesEvent::Move,
                    &series_uid,
                    0,
                    &dest.display().to_string(),
                    "",
                )
                .await;
            }
            continue;
        }

        let Some(task) = is_ready_for_sending(&folder) else {
            continue;
        };
        if clock.now_epoch_secs() < task.next_retry_at {
            continue;
        }

        if task.series_uid.is_empty() || task.target_name.is_empty() {
            sink.send_event(
                PipelineEvent::Processing,
                Severity::Warning,
                &format!("Missing information for folder {}", folder.display()),
            )
            .await;
        }

        // Claim the folder so the next tick does not pick it up while the
        // transfer is still running.
        if let Err(e) = std::fs::File::create(folder.join(names::SENDING)) {
            log::error!("unable to claim {}: {e}", folder.display());
            sink.send_event(
                PipelineEvent::Processing,
                Severity::Error,
                &format!("Unable to claim folder {}", folder.display()),
            )
            .await;
            continue;
        }

        log::info!("folder {} queued for transfer", folder.display());
        jobs.push(TransferJob { task, folder });
    }

    jobs
}
