use chrono::Duration;
use log::debug;

use crate::db_types::RecordRef;

/// Contract for requesting a delayed re-check of processor-side status.
///
/// Implementations must deduplicate: while a check is already pending for a record, further requests for the same
/// record are dropped, so each record has at most one check in flight. Scheduling is fire-and-forget; failures of the
/// eventual check are the implementation's to log.
pub trait UpdateScheduler: Send + Sync {
    fn schedule(&self, record: RecordRef, delay: Duration);
}

/// Discards every scheduling request. Used where delayed updates must not re-arm themselves, e.g. inside the
/// scheduled check itself, and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScheduler;

impl UpdateScheduler for NullScheduler {
    fn schedule(&self, record: RecordRef, _delay: Duration) {
        debug!("⏲️ Discarding scheduled update request for {record}");
    }
}
