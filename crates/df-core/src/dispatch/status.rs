use std::path::Path;

use crate::names;
use crate::task::{self, TaskDescriptor};

/// The transfer already succeeded; the folder awaits its move to success/.
pub fn has_been_sent(folder: &Path) -> bool {
    folder.join(names::SENT).exists()
}

/// Check a folder against the dispatch-eligibility sentinels and return its
/// descriptor when it may be claimed.
///
/// A folder qualifies when it carries none of `.LOCK` (still being staged),
/// `.SENDING` (claimed), `.SENT` (done) or `.ERROR` (suspended), and its
/// `target.json` parses. The time gate (`next_retry_at`) is the caller's
/// job, since only it has the clock.
pub fn is_ready_for_sending(folder: &Path) -> Option<TaskDescriptor> {
    for sentinel in [names::LOCK, names::SENDING, names::SENT, names::ERROR] {
        if folder.join(sentinel).exists() {
            return None;
        }
    }
    task::read_route_descriptor(folder).ok()
}
