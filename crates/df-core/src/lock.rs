use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use orion_error::StructError;

use crate::error::{CoreReason, CoreResult};

/// Exclusive-create sentinel lock.
///
/// Acquisition creates the sentinel file atomically and succeeds only if it
/// did not exist. The owning guard removes the file on drop, so the lock is
/// released on every control-flow exit including error propagation and
/// panic unwinding. Explicit [`release`](FolderLock::release) is idempotent.
#[derive(Debug)]
pub struct FolderLock {
    path: PathBuf,
    held: bool,
}

impl FolderLock {
    /// Try to take the lock at `path`.
    ///
    /// Returns `Ok(None)` when the sentinel already exists — another worker
    /// owns the resource and the caller should skip it silently. Any other
    /// creation failure is a real error.
    pub fn try_acquire(path: impl AsRef<Path>) -> CoreResult<Option<Self>> {
        let path = path.as_ref();
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(Some(Self {
                path: path.to_path_buf(),
                held: true,
            })),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(StructError::from(CoreReason::FsTransient)
                .with_detail(format!("unable to create lock file {}: {e}", path.display()))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the sentinel. Unlink failure is logged, never propagated.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("unable to remove lock file {}: {e}", self.path.display());
        }
    }
}

impl Drop for FolderLock {
    fn drop(&mut self) {
        self.release();
    }
}
