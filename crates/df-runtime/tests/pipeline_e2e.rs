//! End-to-end pipeline test: a series dropped into incoming/ is routed,
//! dispatched through a stubbed transfer command, and lands in success/.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use df_core::clock::SystemClock;
use df_core::events::SeriesEvent;
use df_core::monitor::RecordingEventSink;
use df_core::notify::RecordingNotifier;
use df_runtime::lifecycle::Pipeline;

fn subdirs(folder: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(folder)
        .map(|entries| {
            entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| p.is_dir())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(unix)]
fn write_stub(path: &Path, exit_code: i32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, format!("#!/bin/sh\nexit {exit_code}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn series_flows_from_incoming_to_success() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let stub = root.join("dcmsend-stub");
    write_stub(&stub, 0);

    let config_path = root.join("dicoflow.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
[folders]
incoming   = "{root}/incoming"
outgoing   = "{root}/outgoing"
success    = "{root}/success"
error      = "{root}/error"
discard    = "{root}/discard"
processing = "{root}/processing"

[dispatch]
retry_max = 3
retry_delay = "60s"
scan_interval = "1s"
router_scan_interval = "1s"
send_command = "{stub}"

[rules.ct_to_pacs]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
            root = root.display(),
            stub = stub.display()
        ),
    )
    .unwrap();

    let sink = Arc::new(RecordingEventSink::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let pipeline = Pipeline::start(
        config_path,
        sink.clone(),
        notifier,
        Arc::new(SystemClock),
    )
    .await
    .unwrap();

    // Bootstrap created the folder tree; now drop a series in. The tags
    // file goes last — it is what makes the series visible to the router.
    let incoming = root.join("incoming");
    std::fs::write(incoming.join("ABC#1.dcm"), b"payload").unwrap();
    std::fs::write(incoming.join("ABC#1.tags"), r#"{"Modality": "CT"}"#).unwrap();

    let success = root.join("success");
    let mut landed = Vec::new();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(200)).await;
        landed = subdirs(&success);
        if !landed.is_empty() {
            break;
        }
    }

    pipeline.shutdown();
    pipeline.wait().await.unwrap();

    assert_eq!(landed.len(), 1, "series never reached the success folder");
    assert!(landed[0].join("ABC#1.dcm").exists());
    assert!(landed[0].join("ABC#1.tags").exists());
    assert!(subdirs(&root.join("outgoing")).is_empty());

    assert!(!sink.series_events(SeriesEvent::Registered).is_empty());
    assert!(!sink.series_events(SeriesEvent::Route).is_empty());
    assert!(!sink.series_events(SeriesEvent::Dispatch).is_empty());
}

#[tokio::test]
async fn pipeline_starts_and_shuts_down_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config_path = root.join("dicoflow.toml");
    std::fs::write(
        &config_path,
        format!(
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
        ),
    )
    .unwrap();

    let sink = Arc::new(RecordingEventSink::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let pipeline = Pipeline::start(
        config_path,
        sink,
        notifier,
        Arc::new(SystemClock),
    )
    .await
    .unwrap();

    // Folder tree was created at bootstrap.
    assert!(root.join("incoming").is_dir());
    assert!(root.join("outgoing").is_dir());

    tokio::time::sleep(Duration::from_millis(100)).await;
    pipeline.shutdown();
    pipeline.wait().await.unwrap();
}

#[tokio::test]
async fn missing_config_fails_bootstrap() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingEventSink::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let result = Pipeline::start(
        dir.path().join("nope.toml"),
        sink,
        notifier,
        Arc::new(SystemClock),
    )
    .await;
    assert!(result.is_err());
}
