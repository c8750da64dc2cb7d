use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Series-level events
// ---------------------------------------------------------------------------

/// Events tied to one specific series, reported to the bookkeeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeriesEvent {
    Unknown,
    /// Series fully received and its tags parsed.
    Registered,
    /// An outgoing folder was staged for a target.
    Route,
    /// Series moved to the discard folder.
    Discard,
    /// Transfer to a target completed.
    Dispatch,
    /// A transfer attempt failed.
    Error,
    /// A folder changed pipeline zone.
    Move,
    /// Retries exhausted; folder quarantined.
    Suspend,
}

impl SeriesEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Registered => "REGISTERED",
            Self::Route => "ROUTE",
            Self::Discard => "DISCARD",
            Self::Dispatch => "DISPATCH",
            Self::Error => "ERROR",
            Self::Move => "MOVE",
            Self::Suspend => "SUSPEND",
        }
    }
}

impl fmt::Display for SeriesEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pipeline-level events
// ---------------------------------------------------------------------------

/// General service events, not tied to a single series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineEvent {
    Unknown,
    Boot,
    Shutdown,
    ShutdownRequest,
    ConfigUpdate,
    Processing,
}

impl PipelineEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Boot => "BOOT",
            Self::Shutdown => "SHUTDOWN",
            Self::ShutdownRequest => "SHUTDOWN_REQUEST",
            Self::ConfigUpdate => "CONFIG_UPDATE",
            Self::Processing => "PROCESSING",
        }
    }
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity attached to pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
