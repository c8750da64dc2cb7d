use df_config::{RuleConfig, Trigger};

use crate::lock::FolderLock;
use crate::names;

use super::Router;

impl Router {
    /// Stage the series into per-rule study folders (`<uid>#<rule>/` under
    /// incoming/) for every triggered study-trigger rule.
    ///
    /// The folders accumulate series until an external study-completion
    /// stage drains them; only the per-series part is handled here. A busy
    /// folder lock means that stage is collecting right now — the series is
    /// left for the next tick.
    pub(super) async fn stage_study_level(
        &self,
        triggered: &[(&str, &RuleConfig)],
        stems: &[String],
        series_uid: &str,
    ) {
        for (name, rule) in triggered {
            if rule.action_trigger != Trigger::Study {
                continue;
            }

            let folder = self
                .config
                .folders
                .incoming
                .join(format!("{series_uid}{}{name}", names::SEPARATOR));
            if !folder.exists() {
                if let Err(e) = std::fs::create_dir(&folder) {
                    log::error!("unable to create folder {}: {e}", folder.display());
                    self.processing_error(&format!("Unable to create folder {}", folder.display()))
                        .await;
                    continue;
                }
            }

            let mut lock = match FolderLock::try_acquire(folder.join(names::LOCK)) {
                Ok(Some(lock)) => lock,
                Ok(None) => return,
                Err(e) => {
                    log::error!("{e}");
                    self.processing_error(&format!(
                        "Unable to create lock file in {}",
                        folder.display()
                    ))
                    .await;
                    return;
                }
            };

            self.push_files(stems, &folder, triggered.len() > 1).await;
            lock.release();
        }
    }
}
