//! File-name conventions shared by every pipeline stage.
//!
//! These are the coordination alphabet of the whole system: series files are
//! matched by prefix + extension, and empty sentinel files encode folder
//! state. Changing any of these breaks compatibility with folders staged by
//! an older service instance.

/// Extension of the opaque payload files.
pub const PAYLOAD_EXT: &str = ".dcm";

/// Extension of the sidecar tag files.
pub const TAGS_EXT: &str = ".tags";

/// Separator between series UID and slice name in per-series file names,
/// and between series UID and rule name in study-level staging folders.
pub const SEPARATOR: &str = "#";

/// Lock sentinel. As `<uid>.LOCK` in incoming/ it guards series assembly;
/// as a bare `.LOCK` inside a staged folder it marks contents in flux.
pub const LOCK: &str = ".LOCK";

/// A dispatcher has claimed this outgoing folder.
pub const SENDING: &str = ".SENDING";

/// Transfer succeeded; folder awaits its move to success/.
pub const SENT: &str = ".SENT";

/// Retries exhausted (in outgoing/), or an incoming file was marked bad by
/// the receiving stage (as the `*.ERROR` suffix).
pub const ERROR: &str = ".ERROR";

/// Task descriptor of a routing folder.
pub const ROUTE_TASK_FILE: &str = "target.json";

/// Task descriptor of a processing folder.
pub const PROCESS_TASK_FILE: &str = "task.json";

/// Status report the transfer tool writes inside the folder.
pub const SEND_REPORT_FILE: &str = "sent.txt";
