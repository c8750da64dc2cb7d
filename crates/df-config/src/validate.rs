use std::collections::BTreeSet;

use crate::flow::FlowConfig;

/// Structural validation run at config load.
///
/// Rule expressions are deliberately NOT parsed here: a malformed expression
/// must only disable that one rule at evaluation time, never the whole
/// service. Unknown rule targets are likewise tolerated — the router reports
/// them per-series and skips.
pub fn validate(config: &FlowConfig) -> anyhow::Result<()> {
    let mut seen = BTreeSet::new();
    for (name, path) in config.folders.all() {
        if path.as_os_str().is_empty() {
            anyhow::bail!("folder '{name}' must not be empty");
        }
        if !seen.insert(path.clone()) {
            anyhow::bail!("folder '{name}' ({}) is used twice", path.display());
        }
    }

    if config.dispatch.retry_max == 0 {
        anyhow::bail!("dispatch.retry_max must be at least 1");
    }
    if config.dispatch.worker_parallelism == 0 {
        anyhow::bail!("dispatch.worker_parallelism must be at least 1");
    }
    if config.dispatch.scan_interval.as_secs() == 0 {
        anyhow::bail!("dispatch.scan_interval must be nonzero");
    }
    if config.dispatch.router_scan_interval.as_secs() == 0 {
        anyhow::bail!("dispatch.router_scan_interval must be nonzero");
    }

    for (name, target) in &config.targets {
        if target.address.is_empty() {
            anyhow::bail!("target '{name}' has an empty address");
        }
        if target.port == 0 {
            anyhow::bail!("target '{name}' has port 0");
        }
    }

    for (name, rule) in &config.rules {
        if rule.expression.trim().is_empty() {
            anyhow::bail!("rule '{name}' has an empty expression");
        }
    }

    Ok(())
}
