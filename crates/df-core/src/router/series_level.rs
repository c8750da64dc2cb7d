use df_config::{Action, RuleConfig, Trigger};
use uuid::Uuid;

use crate::events::SeriesEvent;
use crate::lock::FolderLock;
use crate::names;
use crate::notify::NotificationTrigger;
use crate::task::{self, TaskDescriptor};

use super::Router;

impl Router {
    /// The three series-level passes: routing, processing, notification.
    pub(super) async fn stage_series_level(
        &self,
        triggered: &[(&str, &RuleConfig)],
        stems: &[String],
        series_uid: &str,
    ) {
        self.stage_routing(triggered, stems, series_uid).await;
        self.stage_processing(triggered, stems, series_uid).await;
        self.stage_notification(triggered, stems).await;
    }

    /// Routing pass: collect the targets selected by route-action rules,
    /// de-duplicated so a series is never sent twice to the same target,
    /// then stage the outgoing folders.
    async fn stage_routing(
        &self,
        triggered: &[(&str, &RuleConfig)],
        stems: &[String],
        series_uid: &str,
    ) {
        // target name → applied rule, in selection order; a later rule
        // selecting the same target overwrites the applied rule.
        let mut selected: Vec<(String, String)> = Vec::new();

        for (name, rule) in triggered {
            if rule.action_trigger != Trigger::Series || rule.action != Action::Route {
                continue;
            }
            if let Some(target) = rule.target.as_deref().filter(|t| !t.is_empty()) {
                match selected.iter_mut().find(|(t, _)| t.as_str() == target) {
                    Some((_, applied)) => *applied = name.to_string(),
                    None => selected.push((target.to_string(), name.to_string())),
                }
            }
            self.notify_reception(rule).await;
        }

        self.stage_outgoing(triggered, stems, series_uid, &selected)
            .await;
    }

    /// Stage one `outgoing/<uuid>/` folder per selected target: descriptor
    /// first, then the files. Files are moved only when exactly one rule
    /// triggered overall and this is the last target; otherwise copied.
    async fn stage_outgoing(
        &self,
        triggered: &[(&str, &RuleConfig)],
        stems: &[String],
        series_uid: &str,
        selected: &[(String, String)],
    ) {
        let move_operation = triggered.len() == 1;

        for (idx, (target_name, rule_name)) in selected.iter().enumerate() {
            let Some(target) = self.config.targets.get(target_name) else {
                log::error!("invalid target selected {target_name}");
                self.processing_error(&format!("Invalid target selected {target_name}"))
                    .await;
                continue;
            };

            let folder = self
                .config
                .folders
                .outgoing
                .join(Uuid::new_v4().to_string());
            if let Err(e) = std::fs::create_dir(&folder) {
                log::error!("unable to create outgoing folder {}: {e}", folder.display());
                self.processing_error(&format!(
                    "Unable to create outgoing folder {}",
                    folder.display()
                ))
                .await;
                return;
            }
            if !folder.exists() {
                self.processing_error(&format!(
                    "Creating folder not possible {}",
                    folder.display()
                ))
                .await;
                return;
            }

            let mut lock = match FolderLock::try_acquire(folder.join(names::LOCK)) {
                Ok(Some(lock)) => lock,
                _ => {
                    self.processing_error(&format!(
                        "Unable to create lock file in {}",
                        folder.display()
                    ))
                    .await;
                    return;
                }
            };

            let descriptor =
                TaskDescriptor::for_route(series_uid, Trigger::Series, rule_name, target_name, target);
            if let Err(e) = task::write_route_descriptor(&folder, &descriptor) {
                log::error!("{e}");
                self.processing_error(&format!(
                    "Unable to create task file in {}",
                    folder.display()
                ))
                .await;
                continue;
            }

            self.sink
                .send_series_event(
                    SeriesEvent::Route,
                    series_uid,
                    stems.len(),
                    target_name,
                    rule_name,
                )
                .await;

            let do_move = move_operation && idx + 1 == selected.len();
            self.push_files_lossy(stems, &folder, !do_move).await;

            self.sink
                .send_series_event(
                    SeriesEvent::Move,
                    series_uid,
                    stems.len(),
                    &folder.display().to_string(),
                    "",
                )
                .await;

            lock.release();
        }
    }

    /// Processing pass: stage a `processing/<uuid>/` folder for every
    /// process/both rule.
    async fn stage_processing(
        &self,
        triggered: &[(&str, &RuleConfig)],
        stems: &[String],
        series_uid: &str,
    ) {
        for (name, rule) in triggered {
            if rule.action_trigger != Trigger::Series
                || !matches!(rule.action, Action::Process | Action::Both)
            {
                continue;
            }
            // With a single triggered rule the files can safely be moved;
            // otherwise they are copied and removed by the caller.
            let copy_files = triggered.len() > 1;

            let folder = self
                .config
                .folders
                .processing
                .join(Uuid::new_v4().to_string());
            if let Err(e) = std::fs::create_dir(&folder) {
                log::error!("unable to create processing folder {}: {e}", folder.display());
                self.processing_error(&format!(
                    "Unable to create processing folder {}",
                    folder.display()
                ))
                .await;
                return;
            }
            if !folder.exists() {
                self.processing_error(&format!(
                    "Creating folder not possible {}",
                    folder.display()
                ))
                .await;
                return;
            }

            let mut lock = match FolderLock::try_acquire(folder.join(names::LOCK)) {
                Ok(Some(lock)) => lock,
                _ => {
                    self.processing_error(&format!(
                        "Unable to create lock file in {}",
                        folder.display()
                    ))
                    .await;
                    return;
                }
            };

            let descriptor = TaskDescriptor::for_process(series_uid, Trigger::Series, name);
            if let Err(e) = task::write_process_descriptor(&folder, &descriptor) {
                log::error!("{e}");
                self.processing_error(&format!(
                    "Unable to create task file in {}",
                    folder.display()
                ))
                .await;
                continue;
            }

            if !self.push_files(stems, &folder, copy_files).await {
                self.processing_error(&format!(
                    "Unable to push files into processing folder {}",
                    folder.display()
                ))
                .await;
                return;
            }

            lock.release();
            self.notify_reception(rule).await;
        }
    }

    /// Notification pass: fire the reception webhook for notification-only
    /// rules. If such a rule was the sole trigger, nothing staged the files
    /// anywhere — remove them from incoming.
    async fn stage_notification(&self, triggered: &[(&str, &RuleConfig)], stems: &[String]) {
        for (_, rule) in triggered {
            if rule.action_trigger != Trigger::Series || rule.action != Action::Notification {
                continue;
            }
            self.notify_reception(rule).await;
            if triggered.len() == 1 {
                self.remove_series(stems).await;
            }
        }
    }

    async fn notify_reception(&self, rule: &RuleConfig) {
        self.notifier
            .send_webhook(
                &rule.notification_webhook,
                &rule.notification_payload,
                NotificationTrigger::Reception,
            )
            .await;
    }
}
