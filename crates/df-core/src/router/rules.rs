use df_config::{Action, RuleConfig};
use df_lang::Tags;

use super::Router;

impl Router {
    /// Evaluate every enabled rule against the series tags.
    ///
    /// Returns the triggered rules in configuration (name) order, plus the
    /// name of the discard rule if one won. A discard rule short-circuits:
    /// no later rule is evaluated. Evaluation failures are isolated — the
    /// offending rule is skipped and reported, and routing continues with
    /// the remaining rules.
    pub(super) async fn triggered_rules(
        &self,
        tags: &Tags,
    ) -> (Vec<(&str, &RuleConfig)>, Option<String>) {
        let mut triggered: Vec<(&str, &RuleConfig)> = Vec::new();
        let mut discard_rule = None;

        for (name, rule) in &self.config.rules {
            if rule.disabled {
                continue;
            }
            match df_lang::evaluate(&rule.expression, tags) {
                Ok(true) => {
                    triggered.push((name.as_str(), rule));
                    if rule.action == Action::Discard {
                        discard_rule = Some(name.clone());
                        break;
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    log::error!("invalid rule {name}: {e}");
                    self.processing_error(&format!("Invalid rule: {name}")).await;
                }
            }
        }

        log::info!(
            "triggered rules: [{}]",
            triggered
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        (triggered, discard_rule)
    }
}
