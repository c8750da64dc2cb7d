use serde::Deserialize;

fn default_receiver_id() -> String {
    "ANY-SCP".to_string()
}

fn default_sender_id() -> String {
    "SENDER".to_string()
}

/// One named network destination from `[targets.<name>]`.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Host name or IP address of the receiving node.
    pub address: String,
    pub port: u16,
    /// Application entity title announced for the receiver.
    #[serde(default = "default_receiver_id")]
    pub receiver_id: String,
    /// Application entity title this pipeline sends as.
    #[serde(default = "default_sender_id")]
    pub sender_id: String,
}
