use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Time source for retry stamping and dispatch eligibility.
///
/// All wall-clock reads in the dispatch path go through this trait so the
/// retry state machine can be tested with a deterministic clock.
pub trait Clock: Send + Sync {
    fn now_epoch_secs(&self) -> u64;
}

/// The real wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable clock for tests.
pub struct FixedClock(AtomicU64);

impl FixedClock {
    pub fn new(epoch_secs: u64) -> Self {
        Self(AtomicU64::new(epoch_secs))
    }

    pub fn set(&self, epoch_secs: u64) {
        self.0.store(epoch_secs, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_epoch_secs(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// ISO-8601 rendering of a clock reading, used for collision-renamed folder
/// suffixes.
pub fn iso_timestamp(clock: &dyn Clock) -> String {
    match chrono::DateTime::from_timestamp(clock.now_epoch_secs() as i64, 0) {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
        None => clock.now_epoch_secs().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(100);
        assert_eq!(clock.now_epoch_secs(), 100);
        clock.advance(60);
        assert_eq!(clock.now_epoch_secs(), 160);
        clock.set(10);
        assert_eq!(clock.now_epoch_secs(), 10);
    }

    #[test]
    fn iso_timestamp_is_sortable() {
        let clock = FixedClock::new(1_700_000_000);
        assert_eq!(iso_timestamp(&clock), "2023-11-14T22:13:20");
    }
}
