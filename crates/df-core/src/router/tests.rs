use std::path::{Path, PathBuf};
use std::sync::Arc;

use df_config::FlowConfig;

use crate::events::{Severity, SeriesEvent};
use crate::monitor::{Recorded, RecordingEventSink};
use crate::names;
use crate::notify::RecordingNotifier;
use crate::task;

use super::Router;

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

struct Fixture {
    _dir: tempfile::TempDir,
    config: Arc<FlowConfig>,
    sink: Arc<RecordingEventSink>,
    notifier: Arc<RecordingNotifier>,
}

impl Fixture {
    /// Build a pipeline directory tree under a tempdir and parse a config
    /// with the given `[rules]` / `[targets]` TOML fragments.
    fn new(extra_toml: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().display();
        let toml = format!(
            r#"
[folders]
incoming   = "{root}/incoming"
outgoing   = "{root}/outgoing"
success    = "{root}/success"
error      = "{root}/error"
discard    = "{root}/discard"
processing = "{root}/processing"

{extra_toml}
"#
        );
        let config: FlowConfig = toml.parse().unwrap();
        for (_, folder) in config.folders.all() {
            std::fs::create_dir_all(folder).unwrap();
        }
        Self {
            _dir: dir,
            config: Arc::new(config),
            sink: Arc::new(RecordingEventSink::new()),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    fn router(&self) -> Router {
        Router::new(
            self.config.clone(),
            self.sink.clone(),
            self.notifier.clone(),
        )
    }

    /// Drop a series into incoming/ as `<uid>#<n>.dcm` + `.tags` pairs.
    fn seed_series(&self, uid: &str, slices: usize, tags_json: &str) {
        let incoming = &self.config.folders.incoming;
        for n in 1..=slices {
            std::fs::write(incoming.join(format!("{uid}#{n}.dcm")), b"payload").unwrap();
            std::fs::write(incoming.join(format!("{uid}#{n}.tags")), tags_json).unwrap();
        }
    }

    fn subdirs(&self, folder: &Path) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(folder)
            .unwrap()
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.path())
            .collect();
        dirs.sort();
        dirs
    }

    fn incoming_series_files(&self, uid: &str) -> usize {
        std::fs::read_dir(&self.config.folders.incoming)
            .unwrap()
            .flatten()
            .filter(|e| {
                e.path().is_file()
                    && e.file_name()
                        .to_str()
                        .map(|n| n.starts_with(&format!("{uid}#")))
                        .unwrap_or(false)
            })
            .count()
    }
}

const CT_TAGS: &str = r#"{"Modality": "CT", "BodyPart": "HEAD"}"#;

// ---------------------------------------------------------------------------
// Scenario: single rule, happy path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_rule_route_moves_series_into_outgoing() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
receiver_id = "RCV"
sender_id = "SND"
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    let staged = fx.subdirs(&fx.config.folders.outgoing);
    assert_eq!(staged.len(), 1);
    let folder = &staged[0];

    assert!(folder.join("ABC#1.dcm").exists());
    assert!(folder.join("ABC#1.tags").exists());
    assert!(!folder.join(names::LOCK).exists());

    let descriptor = task::read_route_descriptor(folder).unwrap();
    assert_eq!(descriptor.series_uid, "ABC");
    assert_eq!(descriptor.target_name, "t1");
    assert_eq!(descriptor.applied_rule, "r1");
    assert_eq!(descriptor.target_address, "127.0.0.1");
    assert_eq!(descriptor.target_port, 11112);
    assert_eq!(descriptor.retries, 0);
    assert_eq!(descriptor.next_retry_at, 0);

    // Single triggered rule: the files were moved, not copied.
    assert_eq!(fx.incoming_series_files("ABC"), 0);
    // Series lock released.
    assert!(!fx.config.folders.incoming.join("ABC.LOCK").exists());

    assert_eq!(fx.sink.series_events(SeriesEvent::Registered).len(), 1);
    let routes = fx.sink.series_events(SeriesEvent::Route);
    assert_eq!(routes.len(), 1);
    assert!(matches!(
        &routes[0],
        Recorded::Series { series_uid, file_count, target, info, .. }
            if series_uid == "ABC" && *file_count == 1 && target == "t1" && info == "r1"
    ));
}

// ---------------------------------------------------------------------------
// Scenario: multi-rule fan-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_rules_fan_out_to_two_targets_and_clean_incoming() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[rules.r2]
expression = 'BodyPart == "HEAD"'
action = "route"
target = "t2"

[targets.t1]
address = "127.0.0.1"
port = 11112

[targets.t2]
address = "127.0.0.2"
port = 11113
"#,
    );
    fx.seed_series("ABC", 2, CT_TAGS);

    fx.router().route_series("ABC").await;

    let staged = fx.subdirs(&fx.config.folders.outgoing);
    assert_eq!(staged.len(), 2);
    for folder in &staged {
        assert!(folder.join("ABC#1.dcm").exists());
        assert!(folder.join("ABC#2.dcm").exists());
        assert!(folder.join("ABC#1.tags").exists());
        assert!(folder.join("ABC#2.tags").exists());
    }

    let mut targets: Vec<String> = staged
        .iter()
        .map(|f| task::read_route_descriptor(f).unwrap().target_name)
        .collect();
    targets.sort();
    assert_eq!(targets, vec!["t1", "t2"]);

    // Copies staged everywhere, sources deleted at the end.
    assert_eq!(fx.incoming_series_files("ABC"), 0);
    assert_eq!(fx.sink.series_events(SeriesEvent::Route).len(), 2);
}

// ---------------------------------------------------------------------------
// Scenario: discard wins
// ---------------------------------------------------------------------------

#[tokio::test]
async fn discard_rule_wins_over_route() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[rules.rd]
expression = 'BodyPart == "HEAD"'
action = "discard"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    fx.seed_series("ABC", 2, CT_TAGS);

    fx.router().route_series("ABC").await;

    // No outgoing folder was created.
    assert!(fx.subdirs(&fx.config.folders.outgoing).is_empty());

    let discarded = fx.subdirs(&fx.config.folders.discard);
    assert_eq!(discarded.len(), 1);
    assert!(discarded[0].join("ABC#1.dcm").exists());
    assert!(discarded[0].join("ABC#2.dcm").exists());
    assert!(!discarded[0].join(names::LOCK).exists());
    assert_eq!(fx.incoming_series_files("ABC"), 0);

    let discards = fx.sink.series_events(SeriesEvent::Discard);
    assert_eq!(discards.len(), 1);
    assert!(matches!(
        &discards[0],
        Recorded::Series { series_uid, file_count, info, .. }
            if series_uid == "ABC" && *file_count == 2 && info == "Discard by rule rd"
    ));
}

#[tokio::test]
async fn no_triggered_rule_discards_without_rule_name() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "MR"'
action = "route"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    let discarded = fx.subdirs(&fx.config.folders.discard);
    assert_eq!(discarded.len(), 1);
    let discards = fx.sink.series_events(SeriesEvent::Discard);
    assert!(matches!(
        &discards[0],
        Recorded::Series { info, .. } if info.is_empty()
    ));
}

// ---------------------------------------------------------------------------
// Scenario: invalid rule is isolated
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_rule_is_isolated_and_routing_proceeds() {
    let fx = Fixture::new(
        r#"
[rules.a_bad]
expression = 'Modality == '
action = "route"
target = "t1"

[rules.b_good]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    // The malformed rule was reported...
    assert!(fx.sink.processing_count(Severity::Error) >= 1);
    // ...and the valid one staged exactly as in the happy path.
    let staged = fx.subdirs(&fx.config.folders.outgoing);
    assert_eq!(staged.len(), 1);
    let descriptor = task::read_route_descriptor(&staged[0]).unwrap();
    assert_eq!(descriptor.applied_rule, "b_good");
    assert_eq!(fx.incoming_series_files("ABC"), 0);
}

// ---------------------------------------------------------------------------
// Target de-duplication (one folder per target, always)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_target_gets_a_single_outgoing_folder() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[rules.r2]
expression = 'BodyPart == "HEAD"'
action = "route"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    let staged = fx.subdirs(&fx.config.folders.outgoing);
    assert_eq!(staged.len(), 1);
    // Later rule selecting the same target wins.
    let descriptor = task::read_route_descriptor(&staged[0]).unwrap();
    assert_eq!(descriptor.applied_rule, "r2");
    assert_eq!(fx.incoming_series_files("ABC"), 0);
}

// ---------------------------------------------------------------------------
// Unknown target
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_target_is_reported_and_series_left_in_incoming() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "nowhere"
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    assert!(fx.subdirs(&fx.config.folders.outgoing).is_empty());
    assert!(fx.sink.processing_count(Severity::Error) >= 1);
    // A rule did trigger, so the series was not discarded either.
    assert_eq!(fx.incoming_series_files("ABC"), 2);
}

// ---------------------------------------------------------------------------
// Processing and notification passes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_rule_stages_processing_folder_with_task_file() {
    let fx = Fixture::new(
        r#"
[rules.p1]
expression = 'Modality == "CT"'
action = "process"
notification_webhook = "http://hooks.example.org/p1"
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    let staged = fx.subdirs(&fx.config.folders.processing);
    assert_eq!(staged.len(), 1);
    assert!(staged[0].join("task.json").exists());
    assert!(staged[0].join("ABC#1.dcm").exists());
    assert!(!staged[0].join(names::LOCK).exists());
    // Sole rule: moved.
    assert_eq!(fx.incoming_series_files("ABC"), 0);
    // Reception webhook fired once.
    assert_eq!(fx.notifier.calls().len(), 1);
    assert_eq!(fx.notifier.calls()[0].0, "http://hooks.example.org/p1");
}

#[tokio::test]
async fn notification_only_rule_removes_series() {
    let fx = Fixture::new(
        r#"
[rules.n1]
expression = 'Modality == "CT"'
action = "notification"
notification_webhook = "http://hooks.example.org/n1"
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    assert_eq!(fx.notifier.calls().len(), 1);
    assert!(fx.subdirs(&fx.config.folders.outgoing).is_empty());
    assert!(fx.subdirs(&fx.config.folders.discard).is_empty());
    assert_eq!(fx.incoming_series_files("ABC"), 0);
}

// ---------------------------------------------------------------------------
// Study-level staging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn study_trigger_stages_into_study_folder() {
    let fx = Fixture::new(
        r#"
[rules.s1]
expression = 'Modality == "CT"'
action = "route"
action_trigger = "study"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    fx.seed_series("ABC", 2, CT_TAGS);

    fx.router().route_series("ABC").await;

    let study_folder = fx.config.folders.incoming.join("ABC#s1");
    assert!(study_folder.is_dir());
    assert!(study_folder.join("ABC#1.dcm").exists());
    assert!(study_folder.join("ABC#2.dcm").exists());
    assert!(!study_folder.join(names::LOCK).exists());
    // Study rules never reach the series-level passes.
    assert!(fx.subdirs(&fx.config.folders.outgoing).is_empty());
    assert_eq!(fx.incoming_series_files("ABC"), 0);
}

// ---------------------------------------------------------------------------
// Lock discipline and idempotence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn locked_series_is_skipped_silently() {
    let fx = Fixture::new("");
    fx.seed_series("ABC", 1, CT_TAGS);
    std::fs::write(fx.config.folders.incoming.join("ABC.LOCK"), b"").unwrap();

    fx.router().route_series("ABC").await;

    assert!(fx.sink.records().is_empty());
    assert_eq!(fx.incoming_series_files("ABC"), 2);
    // The foreign lock is left in place.
    assert!(fx.config.folders.incoming.join("ABC.LOCK").exists());
}

#[tokio::test]
async fn routing_twice_is_a_noop() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    let router = fx.router();
    router.route_series("ABC").await;
    let staged_after_first = fx.subdirs(&fx.config.folders.outgoing);

    router.route_series("ABC").await;
    let staged_after_second = fx.subdirs(&fx.config.folders.outgoing);

    assert_eq!(staged_after_first, staged_after_second);
}

// ---------------------------------------------------------------------------
// Tag failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_tags_abandon_the_series() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "t1"

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    let incoming = &fx.config.folders.incoming;
    std::fs::write(incoming.join("ABC#1.dcm"), b"payload").unwrap();
    std::fs::write(incoming.join("ABC#1.tags"), b"not json").unwrap();

    fx.router().route_series("ABC").await;

    assert_eq!(fx.sink.series_events(SeriesEvent::Error).len(), 1);
    assert!(fx.sink.processing_count(Severity::Error) >= 1);
    // Files stay until an operator (or an .ERROR marker) intervenes.
    assert_eq!(fx.incoming_series_files("ABC"), 2);
    assert!(!incoming.join("ABC.LOCK").exists());
}

#[tokio::test]
async fn disabled_rule_is_invisible() {
    let fx = Fixture::new(
        r#"
[rules.r1]
expression = 'Modality == "CT"'
action = "route"
target = "t1"
disabled = true

[targets.t1]
address = "127.0.0.1"
port = 11112
"#,
    );
    fx.seed_series("ABC", 1, CT_TAGS);

    fx.router().route_series("ABC").await;

    // With its only rule disabled, the series is discarded.
    assert!(fx.subdirs(&fx.config.folders.outgoing).is_empty());
    assert_eq!(fx.subdirs(&fx.config.folders.discard).len(), 1);
}
