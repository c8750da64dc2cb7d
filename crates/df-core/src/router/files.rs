use std::path::Path;

use crate::series;

use super::Router;

fn transfer(src: &Path, dst: &Path, copy: bool) -> std::io::Result<()> {
    if copy {
        std::fs::copy(src, dst).map(|_| ())
    } else {
        std::fs::rename(src, dst)
    }
}

impl Router {
    /// Copy or move every payload+sidecar pair of the series into
    /// `target_folder`. Stops at the first failure and reports it; returns
    /// `false` when the target folder is incomplete.
    pub(super) async fn push_files(
        &self,
        stems: &[String],
        target_folder: &Path,
        copy: bool,
    ) -> bool {
        let incoming = &self.config.folders.incoming;
        for stem in stems {
            let result = transfer(
                &series::payload_path(incoming, stem),
                &series::payload_path(target_folder, stem),
                copy,
            )
            .and_then(|_| {
                transfer(
                    &series::tags_path(incoming, stem),
                    &series::tags_path(target_folder, stem),
                    copy,
                )
            });
            if let Err(e) = result {
                log::error!(
                    "problem while pushing file {stem} to {}: {e}",
                    target_folder.display()
                );
                self.processing_error(&format!("Problem while pushing file {stem}"))
                    .await;
                return false;
            }
        }
        true
    }

    /// Per-pair variant that keeps going after individual failures, so one
    /// bad slice does not strand the rest of the series.
    pub(super) async fn push_files_lossy(&self, stems: &[String], target_folder: &Path, copy: bool) {
        let incoming = &self.config.folders.incoming;
        for stem in stems {
            let result = transfer(
                &series::payload_path(incoming, stem),
                &series::payload_path(target_folder, stem),
                copy,
            )
            .and_then(|_| {
                transfer(
                    &series::tags_path(incoming, stem),
                    &series::tags_path(target_folder, stem),
                    copy,
                )
            });
            if let Err(e) = result {
                log::error!(
                    "problem while pushing file {stem} to {}: {e}",
                    target_folder.display()
                );
                self.processing_error(&format!("Problem while pushing file {stem}"))
                    .await;
            }
        }
    }

    /// Delete the series files from the incoming folder (the copies staged
    /// into outgoing/processing folders are the survivors).
    pub(super) async fn remove_series(&self, stems: &[String]) {
        let incoming = &self.config.folders.incoming;
        for stem in stems {
            let result = std::fs::remove_file(series::tags_path(incoming, stem))
                .and_then(|_| std::fs::remove_file(series::payload_path(incoming, stem)));
            if let Err(e) = result {
                log::error!("error while removing file {stem}: {e}");
                self.processing_error(&format!("Error while removing file {stem}"))
                    .await;
            }
        }
    }
}
