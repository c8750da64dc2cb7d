use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Pipeline stage a notification webhook reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationTrigger {
    /// A series matching the rule was received and staged.
    Reception,
}

/// Fire-and-forget webhook delivery for rule notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post `payload` to `url`. An empty URL is a no-op; delivery failures
    /// are logged and swallowed.
    async fn send_webhook(&self, url: &str, payload: &str, trigger: NotificationTrigger);
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    trigger: NotificationTrigger,
    payload: &'a str,
}

// ---------------------------------------------------------------------------
// HttpNotifier
// ---------------------------------------------------------------------------

pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for HttpNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_webhook(&self, url: &str, payload: &str, trigger: NotificationTrigger) {
        if url.is_empty() {
            return;
        }
        let body = WebhookPayload { trigger, payload };
        if let Err(e) = self.client.post(url).json(&body).send().await {
            log::warn!("webhook delivery to {url} failed: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Captures webhook calls for tests.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(String, String, NotificationTrigger)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(String, String, NotificationTrigger)> {
        self.calls.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_webhook(&self, url: &str, payload: &str, trigger: NotificationTrigger) {
        if url.is_empty() {
            return;
        }
        self.calls
            .lock()
            .expect("notifier lock poisoned")
            .push((url.to_string(), payload.to_string(), trigger));
    }
}
