use uuid::Uuid;

use crate::events::SeriesEvent;
use crate::lock::FolderLock;
use crate::names;

use super::Router;

impl Router {
    /// Move the whole series into a fresh `discard/<uuid>/` folder.
    ///
    /// Taken when no rule triggered or when a discard rule won. The discard
    /// folder is periodically cleared by an external cleaner, which skips
    /// folders carrying a `.LOCK`.
    pub(super) async fn stage_discard(
        &self,
        stems: &[String],
        series_uid: &str,
        discard_rule: Option<&str>,
    ) {
        let discard_path = self
            .config
            .folders
            .discard
            .join(Uuid::new_v4().to_string());

        if let Err(e) = std::fs::create_dir(&discard_path) {
            log::error!("unable to create discard folder {}: {e}", discard_path.display());
            self.processing_error(&format!(
                "Unable to create discard folder {}",
                discard_path.display()
            ))
            .await;
            return;
        }
        if !discard_path.exists() {
            self.processing_error(&format!(
                "Creating discard folder not possible {}",
                discard_path.display()
            ))
            .await;
            return;
        }

        let mut lock = match FolderLock::try_acquire(discard_path.join(names::LOCK)) {
            Ok(Some(lock)) => lock,
            _ => {
                self.processing_error(&format!(
                    "Unable to create lock file in discard folder {}",
                    discard_path.display()
                ))
                .await;
                return;
            }
        };

        let info = match discard_rule {
            Some(rule) => format!("Discard by rule {rule}"),
            None => String::new(),
        };
        self.sink
            .send_series_event(SeriesEvent::Discard, series_uid, stems.len(), "", &info)
            .await;

        self.push_files_lossy(stems, &discard_path, false).await;

        self.sink
            .send_series_event(
                SeriesEvent::Move,
                series_uid,
                stems.len(),
                &discard_path.display().to_string(),
                "",
            )
            .await;

        lock.release();
    }
}
