use std::path::Path;

use df_config::{TargetConfig, Trigger};
use orion_error::StructError;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{CoreReason, CoreResult};
use crate::names;

// ---------------------------------------------------------------------------
// TaskDescriptor
// ---------------------------------------------------------------------------

/// The per-folder document telling the downstream stage what to do with a
/// staged series.
///
/// Written as `target.json` in routing folders and `task.json` in processing
/// folders. The descriptor must be durable before the folder becomes
/// eligible for dispatch, and the transfer worker mutates `retries` /
/// `next_retry_at` on every failed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    #[serde(default)]
    pub target_address: String,
    #[serde(default)]
    pub target_port: u16,
    #[serde(default)]
    pub target_receiver_id: String,
    #[serde(default)]
    pub target_sender_id: String,
    #[serde(default)]
    pub target_name: String,
    pub applied_rule: String,
    pub series_uid: String,
    #[serde(default)]
    pub trigger: Trigger,
    #[serde(default)]
    pub retries: u32,
    /// Epoch seconds before which the folder is not dispatch-eligible.
    #[serde(default)]
    pub next_retry_at: u64,
}

impl TaskDescriptor {
    /// Descriptor for a routing folder bound for `target`.
    pub fn for_route(
        series_uid: &str,
        trigger: Trigger,
        applied_rule: &str,
        target_name: &str,
        target: &TargetConfig,
    ) -> Self {
        Self {
            target_address: target.address.clone(),
            target_port: target.port,
            target_receiver_id: target.receiver_id.clone(),
            target_sender_id: target.sender_id.clone(),
            target_name: target_name.to_string(),
            applied_rule: applied_rule.to_string(),
            series_uid: series_uid.to_string(),
            trigger,
            retries: 0,
            next_retry_at: 0,
        }
    }

    /// Descriptor for a processing folder; no network destination.
    pub fn for_process(series_uid: &str, trigger: Trigger, applied_rule: &str) -> Self {
        Self {
            target_address: String::new(),
            target_port: 0,
            target_receiver_id: String::new(),
            target_sender_id: String::new(),
            target_name: String::new(),
            applied_rule: applied_rule.to_string(),
            series_uid: series_uid.to_string(),
            trigger,
            retries: 0,
            next_retry_at: 0,
        }
    }

    /// `series_uid` as reported in events; descriptors that lack the field
    /// get a recognizable placeholder.
    pub fn series_uid_or_missing(&self) -> &str {
        if self.series_uid.is_empty() {
            "series_uid-missing"
        } else {
            &self.series_uid
        }
    }

    pub fn target_name_or_missing(&self) -> &str {
        if self.target_name.is_empty() {
            "target_name-missing"
        } else {
            &self.target_name
        }
    }
}

// ---------------------------------------------------------------------------
// Folder I/O
// ---------------------------------------------------------------------------

/// Read the routing descriptor (`target.json`) of an outgoing folder.
pub fn read_route_descriptor(folder: &Path) -> CoreResult<TaskDescriptor> {
    read_descriptor(&folder.join(names::ROUTE_TASK_FILE))
}

fn read_descriptor(path: &Path) -> CoreResult<TaskDescriptor> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        StructError::from(CoreReason::FsTransient)
            .with_detail(format!("unable to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        StructError::from(CoreReason::FsTransient)
            .with_detail(format!("malformed task descriptor {}: {e}", path.display()))
    })
}

/// Write the routing descriptor into a folder being staged.
pub fn write_route_descriptor(folder: &Path, task: &TaskDescriptor) -> CoreResult<()> {
    write_descriptor(&folder.join(names::ROUTE_TASK_FILE), task)
}

/// Write the processing descriptor into a folder being staged.
pub fn write_process_descriptor(folder: &Path, task: &TaskDescriptor) -> CoreResult<()> {
    write_descriptor(&folder.join(names::PROCESS_TASK_FILE), task)
}

/// Durable write: serialize to a temp file in the same directory, then
/// rename over the final name. A crash leaves either no descriptor or a
/// complete one, never a torn write.
fn write_descriptor(path: &Path, task: &TaskDescriptor) -> CoreResult<()> {
    let json = serde_json::to_string(task).map_err(|e| {
        StructError::from(CoreReason::FsTransient)
            .with_detail(format!("unable to serialize task descriptor: {e}"))
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| {
        StructError::from(CoreReason::FsTransient)
            .with_detail(format!("unable to write {}: {e}", tmp.display()))
    })?;
    std::fs::rename(&tmp, path).map_err(|e| {
        StructError::from(CoreReason::FsTransient)
            .with_detail(format!("unable to move {} into place: {e}", tmp.display()))
    })?;
    Ok(())
}

/// Record a failed transfer attempt: bump `retries` and push `next_retry_at`
/// past the configured delay. Returns the new retry count.
///
/// The write is durable before the caller clears `.SENDING`, so a crash can
/// only repeat an attempt, never lose the count.
pub fn increase_retry(folder: &Path, retry_delay_secs: u64, clock: &dyn Clock) -> CoreResult<u32> {
    let mut task = read_route_descriptor(folder)?;
    task.retries += 1;
    task.next_retry_at = clock.now_epoch_secs() + retry_delay_secs;
    write_route_descriptor(folder, &task)?;
    Ok(task.retries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn target() -> TargetConfig {
        TargetConfig {
            address: "127.0.0.1".into(),
            port: 11112,
            receiver_id: "RCV".into(),
            sender_id: "SND".into(),
        }
    }

    #[test]
    fn route_descriptor_fields() {
        let task = TaskDescriptor::for_route("ABC", Trigger::Series, "r1", "t1", &target());
        assert_eq!(task.target_address, "127.0.0.1");
        assert_eq!(task.target_port, 11112);
        assert_eq!(task.target_name, "t1");
        assert_eq!(task.applied_rule, "r1");
        assert_eq!(task.series_uid, "ABC");
        assert_eq!(task.retries, 0);
        assert_eq!(task.next_retry_at, 0);
    }

    #[test]
    fn descriptor_roundtrip_via_folder() {
        let dir = tempfile::tempdir().unwrap();
        let task = TaskDescriptor::for_route("ABC", Trigger::Series, "r1", "t1", &target());
        write_route_descriptor(dir.path(), &task).unwrap();
        let read = read_route_descriptor(dir.path()).unwrap();
        assert_eq!(read, task);
        // No temp file left behind.
        assert!(!dir.path().join("target.json.tmp").exists());
    }

    #[test]
    fn retry_counters_default_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("target.json"),
            r#"{"series_uid": "ABC", "applied_rule": "r1", "target_name": "t1"}"#,
        )
        .unwrap();
        let task = read_route_descriptor(dir.path()).unwrap();
        assert_eq!(task.retries, 0);
        assert_eq!(task.next_retry_at, 0);
        assert_eq!(task.trigger, Trigger::Series);
    }

    #[test]
    fn increase_retry_is_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let clock = FixedClock::new(1_000);
        let task = TaskDescriptor::for_route("ABC", Trigger::Series, "r1", "t1", &target());
        write_route_descriptor(dir.path(), &task).unwrap();

        assert_eq!(increase_retry(dir.path(), 60, &clock).unwrap(), 1);
        let after_first = read_route_descriptor(dir.path()).unwrap();
        assert_eq!(after_first.retries, 1);
        assert_eq!(after_first.next_retry_at, 1_060);

        clock.advance(120);
        assert_eq!(increase_retry(dir.path(), 60, &clock).unwrap(), 2);
        let after_second = read_route_descriptor(dir.path()).unwrap();
        assert_eq!(after_second.retries, 2);
        assert!(after_second.next_retry_at > after_first.next_retry_at);
    }

    #[test]
    fn missing_descriptor_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_route_descriptor(dir.path()).is_err());
    }

    #[test]
    fn placeholders_for_missing_identity() {
        let task = TaskDescriptor::for_process("", Trigger::Series, "r1");
        assert_eq!(task.series_uid_or_missing(), "series_uid-missing");
        assert_eq!(task.target_name_or_missing(), "target_name-missing");
    }
}
