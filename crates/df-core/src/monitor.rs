use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::events::{PipelineEvent, Severity, SeriesEvent};

/// Best-effort connection to the bookkeeper service.
///
/// Every method swallows transport failures after logging them — event
/// reporting must never block or fail operational flow.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Report a general pipeline event (boot, shutdown, processing issues).
    async fn send_event(&self, event: PipelineEvent, severity: Severity, description: &str);

    /// Report an event tied to one series.
    async fn send_series_event(
        &self,
        event: SeriesEvent,
        series_uid: &str,
        file_count: usize,
        target: &str,
        info: &str,
    );

    /// Register a freshly received series with its full tag document.
    async fn send_register_series(&self, tags: &serde_json::Value);
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct EventPayload<'a> {
    sender: &'a str,
    event: PipelineEvent,
    severity: Severity,
    description: &'a str,
}

#[derive(Serialize)]
struct SeriesEventPayload<'a> {
    sender: &'a str,
    event: SeriesEvent,
    series_uid: &'a str,
    file_count: usize,
    target: &'a str,
    info: &'a str,
}

// ---------------------------------------------------------------------------
// HttpEventSink
// ---------------------------------------------------------------------------

/// Posts events to the bookkeeper HTTP endpoint with a short timeout.
pub struct HttpEventSink {
    client: reqwest::Client,
    base_url: String,
    sender: String,
}

impl HttpEventSink {
    /// `address` is `host:port`; `module` and `instance` form the sender
    /// identity (e.g. `router.main`).
    pub fn new(address: &str, module: &str, instance: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: format!("http://{address}"),
            sender: format!("{module}.{instance}"),
        }
    }

    async fn post<T: Serialize>(&self, endpoint: &str, payload: &T) {
        let url = format!("{}/{endpoint}", self.base_url);
        if let Err(e) = self.client.post(&url).json(payload).send().await {
            log::warn!("failed request to bookkeeper: {e}");
        }
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn send_event(&self, event: PipelineEvent, severity: Severity, description: &str) {
        self.post(
            "event",
            &EventPayload {
                sender: &self.sender,
                event,
                severity,
                description,
            },
        )
        .await;
    }

    async fn send_series_event(
        &self,
        event: SeriesEvent,
        series_uid: &str,
        file_count: usize,
        target: &str,
        info: &str,
    ) {
        self.post(
            "series-event",
            &SeriesEventPayload {
                sender: &self.sender,
                event,
                series_uid,
                file_count,
                target,
                info,
            },
        )
        .await;
    }

    async fn send_register_series(&self, tags: &serde_json::Value) {
        self.post("register-series", tags).await;
    }
}

// ---------------------------------------------------------------------------
// NullEventSink
// ---------------------------------------------------------------------------

/// Drops every event; used when no bookkeeper is configured.
pub struct NullEventSink;

#[async_trait]
impl EventSink for NullEventSink {
    async fn send_event(&self, _: PipelineEvent, _: Severity, _: &str) {}

    async fn send_series_event(&self, _: SeriesEvent, _: &str, _: usize, _: &str, _: &str) {}

    async fn send_register_series(&self, _: &serde_json::Value) {}
}

// ---------------------------------------------------------------------------
// RecordingEventSink
// ---------------------------------------------------------------------------

/// In-memory sink used by tests to assert on the emitted event stream.
#[derive(Default)]
pub struct RecordingEventSink {
    records: Mutex<Vec<Recorded>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Event {
        event: PipelineEvent,
        severity: Severity,
        description: String,
    },
    Series {
        event: SeriesEvent,
        series_uid: String,
        file_count: usize,
        target: String,
        info: String,
    },
    Register(serde_json::Value),
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Recorded> {
        self.records.lock().expect("sink lock poisoned").clone()
    }

    /// All recorded series events of the given kind.
    pub fn series_events(&self, kind: SeriesEvent) -> Vec<Recorded> {
        self.records()
            .into_iter()
            .filter(|r| matches!(r, Recorded::Series { event, .. } if *event == kind))
            .collect()
    }

    /// Number of PROCESSING events at the given severity.
    pub fn processing_count(&self, at: Severity) -> usize {
        self.records()
            .iter()
            .filter(|r| {
                matches!(r, Recorded::Event { event, severity, .. }
                    if *event == PipelineEvent::Processing && *severity == at)
            })
            .count()
    }
}

#[async_trait]
impl EventSink for RecordingEventSink {
    async fn send_event(&self, event: PipelineEvent, severity: Severity, description: &str) {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push(Recorded::Event {
                event,
                severity,
                description: description.to_string(),
            });
    }

    async fn send_series_event(
        &self,
        event: SeriesEvent,
        series_uid: &str,
        file_count: usize,
        target: &str,
        info: &str,
    ) {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push(Recorded::Series {
                event,
                series_uid: series_uid.to_string(),
                file_count,
                target: target.to_string(),
                info: info.to_string(),
            });
    }

    async fn send_register_series(&self, tags: &serde_json::Value) {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push(Recorded::Register(tags.clone()));
    }
}
