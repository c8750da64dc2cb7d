use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Action / Trigger
// ---------------------------------------------------------------------------

/// What happens when a rule triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Stage the series for network transfer to `target`.
    Route,
    /// Stage the series for a local processing module.
    Process,
    /// Both route and process.
    Both,
    /// Fire the notification webhook only.
    Notification,
    /// Drop the series into the discard folder. Wins over all other rules.
    Discard,
}

/// Granularity at which the rule's action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Series,
    Study,
}

impl Default for Trigger {
    fn default() -> Self {
        Trigger::Series
    }
}

// ---------------------------------------------------------------------------
// RuleConfig
// ---------------------------------------------------------------------------

/// One named routing rule from `[rules.<name>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Boolean expression over the series tags (see `df_lang`).
    pub expression: String,
    pub action: Action,
    #[serde(default)]
    pub action_trigger: Trigger,
    /// A disabled rule is invisible to evaluation.
    #[serde(default)]
    pub disabled: bool,
    /// Target name for `route` actions; resolved against `[targets]`.
    #[serde(default)]
    pub target: Option<String>,
    /// Webhook fired on series reception; empty string disables it.
    #[serde(default)]
    pub notification_webhook: String,
    /// Free-form payload forwarded with the webhook.
    #[serde(default)]
    pub notification_payload: String,
}
