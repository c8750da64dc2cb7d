use std::path::{Path, PathBuf};

use orion_error::StructError;

use crate::error::{CoreReason, CoreResult};
use crate::names;

/// All stems (file names without extension) of a series currently present
/// in `incoming`, discovered via their sidecar tags files.
///
/// The result is sorted so the "first" stem — whose tags file is
/// authoritative for rule evaluation — is stable across ticks. The choice
/// itself carries no meaning; every file of a series shares the same
/// series-level tags.
pub fn collect_series_stems(incoming: &Path, series_uid: &str) -> CoreResult<Vec<String>> {
    let prefix = format!("{series_uid}{}", names::SEPARATOR);
    let entries = std::fs::read_dir(incoming).map_err(|e| {
        StructError::from(CoreReason::FsTransient)
            .with_detail(format!("unable to scan {}: {e}", incoming.display()))
    })?;

    let mut stems = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(&prefix) || !name.ends_with(names::TAGS_EXT) {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }
        stems.push(name[..name.len() - names::TAGS_EXT.len()].to_string());
    }
    stems.sort();
    Ok(stems)
}

/// Every distinct series UID with at least one tags file in `incoming`.
pub fn collect_series_uids(incoming: &Path) -> CoreResult<Vec<String>> {
    let entries = std::fs::read_dir(incoming).map_err(|e| {
        StructError::from(CoreReason::FsTransient)
            .with_detail(format!("unable to scan {}: {e}", incoming.display()))
    })?;

    let mut uids = Vec::new();
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(names::TAGS_EXT) {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(true) {
            continue;
        }
        let Some(sep) = name.find(names::SEPARATOR) else {
            continue;
        };
        let uid = &name[..sep];
        if !uid.is_empty() && !uids.iter().any(|u| u == uid) {
            uids.push(uid.to_string());
        }
    }
    uids.sort();
    Ok(uids)
}

/// Path of a stem's payload file.
pub fn payload_path(folder: &Path, stem: &str) -> PathBuf {
    folder.join(format!("{stem}{}", names::PAYLOAD_EXT))
}

/// Path of a stem's sidecar tags file.
pub fn tags_path(folder: &Path, stem: &str) -> PathBuf {
    folder.join(format!("{stem}{}", names::TAGS_EXT))
}
