mod discard;
mod files;
mod rules;
mod series_level;
mod study;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use df_config::FlowConfig;

use crate::events::{PipelineEvent, Severity, SeriesEvent};
use crate::lock::FolderLock;
use crate::monitor::EventSink;
use crate::names;
use crate::notify::Notifier;
use crate::series;
use crate::tags::TagSet;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Converts series-in-incoming into staged per-target folders.
///
/// One router instance is built per tick from the freshly loaded
/// configuration; it holds no state of its own — ground truth is the
/// filesystem, and coordination with concurrent workers happens purely
/// through lock sentinels.
pub struct Router {
    config: Arc<FlowConfig>,
    sink: Arc<dyn EventSink>,
    notifier: Arc<dyn Notifier>,
}

impl Router {
    pub fn new(
        config: Arc<FlowConfig>,
        sink: Arc<dyn EventSink>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            sink,
            notifier,
        }
    }

    /// Process one series from the incoming folder.
    ///
    /// Failures never escape: each is reported to the event sink and the
    /// series is left for the next tick (or for an operator). A busy series
    /// lock means another worker owns the series — skip silently.
    pub async fn route_series(&self, series_uid: &str) {
        let incoming = &self.config.folders.incoming;
        let lock_path = incoming.join(format!("{series_uid}{}", names::LOCK));

        let mut lock = match FolderLock::try_acquire(&lock_path) {
            Ok(Some(lock)) => lock,
            // Another instance is working on this series.
            Ok(None) => return,
            Err(e) => {
                log::error!("{e}");
                self.processing_error(&format!(
                    "Unable to create lock file {}",
                    lock_path.display()
                ))
                .await;
                return;
            }
        };

        log::info!("processing series {series_uid}");

        let stems = match series::collect_series_stems(incoming, series_uid) {
            Ok(stems) => stems,
            Err(e) => {
                log::error!("{e}");
                self.processing_error(&format!("Unable to scan incoming folder: {e}"))
                    .await;
                return;
            }
        };
        if stems.is_empty() {
            return;
        }
        log::info!("payload files found: {}", stems.len());

        let tags = match TagSet::read(&series::tags_path(incoming, &stems[0])) {
            Ok(tags) => tags,
            Err(e) => {
                log::error!("{e}");
                self.sink
                    .send_series_event(SeriesEvent::Error, series_uid, 0, "", "Invalid tag information")
                    .await;
                self.processing_error(&format!("Invalid tags for series {series_uid}"))
                    .await;
                return;
            }
        };

        self.sink.send_register_series(tags.raw()).await;
        self.sink
            .send_series_event(SeriesEvent::Registered, series_uid, stems.len(), "", "")
            .await;

        let (triggered, discard_rule) = self.triggered_rules(tags.values()).await;

        if triggered.is_empty() || discard_rule.is_some() {
            // No rule wants the series, or a discard rule won.
            self.stage_discard(&stems, series_uid, discard_rule.as_deref())
                .await;
        } else {
            // One triggered rule: the final stage moves the files.
            // Multiple: every stage copies, and the sources go afterwards.
            self.stage_study_level(&triggered, &stems, series_uid).await;
            self.stage_series_level(&triggered, &stems, series_uid).await;
            if triggered.len() > 1 {
                self.remove_series(&stems).await;
            }
        }

        lock.release();
    }

    pub(crate) async fn processing_error(&self, description: &str) {
        self.sink
            .send_event(PipelineEvent::Processing, Severity::Error, description)
            .await;
    }
}
