use df_config::FlowConfig;

use crate::events::{PipelineEvent, Severity};
use crate::lock::FolderLock;
use crate::monitor::EventSink;
use crate::names;

/// Sweep incoming/ for `*.ERROR` markers left by the receiving stage and
/// quarantine them (plus their paired payload file) into the error folder.
///
/// A busy per-file lock means another instance is on it — skip. One
/// aggregate `PROCESSING/ERROR` event is emitted when anything was found.
pub async fn route_error_files(config: &FlowConfig, sink: &dyn EventSink) {
    let incoming = &config.folders.incoming;
    let error_folder = &config.folders.error;

    let entries = match std::fs::read_dir(incoming) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("unable to scan {}: {e}", incoming.display());
            return;
        }
    };

    let mut error_files_found = 0usize;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(names::ERROR) || name.len() == names::ERROR.len() {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }

        let lock_path = incoming.join(format!("{name}{}", names::LOCK));
        let Ok(Some(mut lock)) = FolderLock::try_acquire(&lock_path) else {
            continue;
        };

        log::error!("found incoming error file {name}");
        error_files_found += 1;

        if let Err(e) = std::fs::rename(entry.path(), error_folder.join(name)) {
            log::error!("unable to quarantine {name}: {e}");
            continue;
        }

        // The marker is `<payload>.ERROR`; move the payload along if it is
        // still there.
        let payload_name = &name[..name.len() - names::ERROR.len()];
        let payload = incoming.join(payload_name);
        if payload.exists() {
            if let Err(e) = std::fs::rename(&payload, error_folder.join(payload_name)) {
                log::error!("unable to quarantine payload {payload_name}: {e}");
            }
        }

        lock.release();
    }

    if error_files_found > 0 {
        sink.send_event(
            PipelineEvent::Processing,
            Severity::Error,
            &format!("Error parsing {error_files_found} incoming files"),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::RecordingEventSink;
    use std::path::Path;

    fn test_config(root: &Path) -> FlowConfig {
        let toml = format!(
            r#"
[folders]
incoming   = "{root}/incoming"
outgoing   = "{root}/outgoing"
success    = "{root}/success"
error      = "{root}/error"
discard    = "{root}/discard"
processing = "{root}/processing"
"#,
            root = root.display()
        );
        let config: FlowConfig = toml.parse().unwrap();
        for (_, folder) in config.folders.all() {
            std::fs::create_dir_all(folder).unwrap();
        }
        config
    }

    #[tokio::test]
    async fn quarantines_marker_and_payload() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let sink = RecordingEventSink::new();

        std::fs::write(config.folders.incoming.join("ABC#1.dcm.ERROR"), b"").unwrap();
        std::fs::write(config.folders.incoming.join("ABC#1.dcm"), b"payload").unwrap();
        std::fs::write(config.folders.incoming.join("ABC#1.tags"), b"{}").unwrap();

        route_error_files(&config, &sink).await;

        assert!(config.folders.error.join("ABC#1.dcm.ERROR").exists());
        assert!(config.folders.error.join("ABC#1.dcm").exists());
        assert!(!config.folders.incoming.join("ABC#1.dcm").exists());
        // The tags file is not part of the quarantine sweep.
        assert!(config.folders.incoming.join("ABC#1.tags").exists());
        assert_eq!(sink.processing_count(Severity::Error), 1);
    }

    #[tokio::test]
    async fn locked_marker_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let sink = RecordingEventSink::new();

        std::fs::write(config.folders.incoming.join("ABC#1.dcm.ERROR"), b"").unwrap();
        std::fs::write(config.folders.incoming.join("ABC#1.dcm.ERROR.LOCK"), b"").unwrap();

        route_error_files(&config, &sink).await;

        assert!(config.folders.incoming.join("ABC#1.dcm.ERROR").exists());
        assert_eq!(sink.processing_count(Severity::Error), 0);
    }

    #[tokio::test]
    async fn nothing_to_do_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let sink = RecordingEventSink::new();

        route_error_files(&config, &sink).await;
        assert!(sink.records().is_empty());
    }
}
