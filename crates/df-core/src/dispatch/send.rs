use std::path::{Path, PathBuf};

use tokio::process::Command;

use crate::clock::{Clock, iso_timestamp};
use crate::events::{PipelineEvent, Severity, SeriesEvent};
use crate::monitor::EventSink;
use crate::names;
use crate::task;

use super::{DispatchContext, TransferJob};

// ---------------------------------------------------------------------------
// Exit-code contract of the external transfer tool
// ---------------------------------------------------------------------------

/// Symbolic reasons for the transfer tool's known non-zero exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferFailure {
    Syntax,
    NoInputFiles,
    InvalidInput,
    NoValidInput,
    CannotWriteReport,
    CannotInitNetwork,
    CannotNegotiateAssoc,
    CannotSendRequest,
    CannotAddPresCtx,
    Unknown,
}

impl TransferFailure {
    pub fn from_exit_code(code: i32) -> Self {
        match code {
            1 => Self::Syntax,
            21 => Self::NoInputFiles,
            22 => Self::InvalidInput,
            23 => Self::NoValidInput,
            43 => Self::CannotWriteReport,
            60 => Self::CannotInitNetwork,
            61 => Self::CannotNegotiateAssoc,
            62 => Self::CannotSendRequest,
            65 => Self::CannotAddPresCtx,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Syntax => "SYNTAX",
            Self::NoInputFiles => "NO_INPUT_FILES",
            Self::InvalidInput => "INVALID_INPUT",
            Self::NoValidInput => "NO_VALID_INPUT",
            Self::CannotWriteReport => "CANNOT_WRITE_REPORT",
            Self::CannotInitNetwork => "CANNOT_INIT_NETWORK",
            Self::CannotNegotiateAssoc => "CANNOT_NEGOTIATE_ASSOC",
            Self::CannotSendRequest => "CANNOT_SEND_REQUEST",
            Self::CannotAddPresCtx => "CANNOT_ADD_PRES_CTX",
            Self::Unknown => "UNKNOWN",
        }
    }
}

// ---------------------------------------------------------------------------
// Transfer worker
// ---------------------------------------------------------------------------

/// Arguments for the external DICOM send, mirroring the dcmsend invocation:
/// scan the folder for payload files, write a status report inside it.
fn compose_send_args(job: &TransferJob) -> Vec<String> {
    let report = job.folder.join(names::SEND_REPORT_FILE);
    vec![
        job.task.target_address.clone(),
        job.task.target_port.to_string(),
        "+sd".into(),
        job.folder.display().to_string(),
        "-aet".into(),
        job.task.target_sender_id.clone(),
        "-aec".into(),
        job.task.target_receiver_id.clone(),
        "-nuc".into(),
        "+sp".into(),
        format!("*{}", names::PAYLOAD_EXT),
        "-to".into(),
        "60".into(),
        "+crf".into(),
        report.display().to_string(),
    ]
}

/// Run the external transfer for one claimed folder and settle the outcome:
/// success moves the folder to success/, failure drives the retry state
/// machine and may suspend the folder to error/.
///
/// Ordering guarantees: on success `.SENT` exists before the folder moves;
/// on failure the bumped retry counter is durable before `.SENDING` is
/// cleared.
pub async fn execute(
    job: &TransferJob,
    ctx: &DispatchContext,
    sink: &dyn EventSink,
    clock: &dyn Clock,
) {
    let series_uid = job.task.series_uid_or_missing().to_string();
    let target_name = job.task.target_name_or_missing().to_string();
    let args = compose_send_args(job);
    log::debug!("running {} {}", ctx.send_command.display(), args.join(" "));

    let status = Command::new(&ctx.send_command).args(&args).status().await;

    match status {
        Ok(status) if status.success() => {
            log::info!(
                "folder {} successfully sent, moving to {}",
                job.folder.display(),
                ctx.success_folder.display()
            );
            let file_count = count_payload_files(&job.folder);
            sink.send_series_event(SeriesEvent::Dispatch, &series_uid, file_count, &target_name, "")
                .await;
            if let Err(e) = std::fs::File::create(job.folder.join(names::SENT)) {
                // The dispatcher's `.SENT` sweep cannot resume this; still
                // attempt the move directly.
                log::warn!("unable to mark {} as sent: {e}", job.folder.display());
            }
            move_folder(&job.folder, &ctx.success_folder, clock, sink).await;
        }
        Ok(status) => {
            let reason = TransferFailure::from_exit_code(status.code().unwrap_or(-1));
            log::error!(
                "transfer of {} to {target_name} failed: {}",
                job.folder.display(),
                reason.as_str()
            );
            handle_failure(job, ctx, sink, clock, &series_uid, &target_name, reason).await;
        }
        Err(e) => {
            log::error!(
                "unable to run transfer command {}: {e}",
                ctx.send_command.display()
            );
            handle_failure(
                job,
                ctx,
                sink,
                clock,
                &series_uid,
                &target_name,
                TransferFailure::Unknown,
            )
            .await;
        }
    }
}

async fn handle_failure(
    job: &TransferJob,
    ctx: &DispatchContext,
    sink: &dyn EventSink,
    clock: &dyn Clock,
    series_uid: &str,
    target_name: &str,
    reason: TransferFailure,
) {
    sink.send_event(
        PipelineEvent::Processing,
        Severity::Error,
        &format!("Error sending {series_uid} to {target_name}"),
    )
    .await;
    sink.send_series_event(SeriesEvent::Error, series_uid, 0, target_name, reason.as_str())
        .await;

    let retries = match task::increase_retry(&job.folder, ctx.retry_delay.as_secs(), clock) {
        Ok(retries) => retries,
        Err(e) => {
            // Counter not durable — abandon the folder for this tick rather
            // than risk an uncounted attempt loop staying claimed forever.
            log::error!("{e}");
            sink.send_event(
                PipelineEvent::Processing,
                Severity::Error,
                &format!("Unable to update retry state for {}", job.folder.display()),
            )
            .await;
            remove_sending(&job.folder);
            return;
        }
    };

    if retries >= ctx.retry_max {
        log::info!(
            "max retries reached, moving {} to {}",
            job.folder.display(),
            ctx.error_folder.display()
        );
        sink.send_series_event(
            SeriesEvent::Suspend,
            series_uid,
            0,
            target_name,
            "Max retries reached",
        )
        .await;
        if let Err(e) = std::fs::File::create(job.folder.join(names::ERROR)) {
            log::warn!("unable to mark {} as failed: {e}", job.folder.display());
        }
        if let Some(dest) = move_folder(&job.folder, &ctx.error_folder, clock, sink).await {
            sink.send_series_event(SeriesEvent::Move, series_uid, 0, &dest.display().to_string(), "")
                .await;
        }
        sink.send_event(
            PipelineEvent::Processing,
            Severity::Error,
            "Series suspended after reaching max retries",
        )
        .await;
    } else {
        // Eligible again once the clock passes next_retry_at.
        remove_sending(&job.folder);
    }
}

fn remove_sending(folder: &Path) {
    let sending = folder.join(names::SENDING);
    if let Err(e) = std::fs::remove_file(&sending) {
        log::warn!("unable to remove {}: {e}", sending.display());
    }
}

fn count_payload_files(folder: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(folder) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| name.ends_with(names::PAYLOAD_EXT))
                .unwrap_or(false)
        })
        .count()
}

// ---------------------------------------------------------------------------
// Collision-safe folder move
// ---------------------------------------------------------------------------

/// Move `folder` into `dest_dir`, renaming with an ISO-8601 suffix when a
/// folder of the same name is already there. Any leftover `.SENDING`
/// sentinel inside the moved folder is removed afterwards.
///
/// Returns the final path, or `None` when the move failed (reported).
pub async fn move_folder(
    folder: &Path,
    dest_dir: &Path,
    clock: &dyn Clock,
    sink: &dyn EventSink,
) -> Option<PathBuf> {
    let Some(basename) = folder.file_name().and_then(|n| n.to_str()) else {
        log::error!("folder {} has no usable name", folder.display());
        return None;
    };

    let mut dest = dest_dir.join(basename);
    if dest.exists() {
        dest = dest_dir.join(format!("{basename}_{}", iso_timestamp(clock)));
    }

    log::debug!("moving {} to {}", folder.display(), dest.display());
    if let Err(e) = std::fs::rename(folder, &dest) {
        log::error!(
            "error moving folder {} to {}: {e}",
            folder.display(),
            dest.display()
        );
        sink.send_event(
            PipelineEvent::Processing,
            Severity::Error,
            &format!("Error moving {} to {}", folder.display(), dest.display()),
        )
        .await;
        return None;
    }

    let sending = dest.join(names::SENDING);
    if sending.exists() {
        let _ = std::fs::remove_file(&sending);
    }

    Some(dest)
}
