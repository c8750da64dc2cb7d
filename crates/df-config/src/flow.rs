use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::dispatch::DispatchConfig;
use crate::folders::FoldersConfig;
use crate::logging::LoggingConfig;
use crate::rule::RuleConfig;
use crate::target::TargetConfig;
use crate::validate;

/// Top-level pipeline configuration (`dicoflow.toml`), validated on load.
///
/// Rules and targets are kept in `BTreeMap`s so rule evaluation and target
/// staging enumerate in a deterministic (name) order.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    pub folders: FoldersConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Bookkeeper address (`host:port`). Absent → event reporting disabled.
    #[serde(default)]
    pub bookkeeper: Option<String>,
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl FlowConfig {
    /// Read and parse a `dicoflow.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }
}

impl FromStr for FlowConfig {
    type Err = anyhow::Error;

    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let config: FlowConfig = toml::from_str(toml_str)?;
        validate::validate(&config)?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
