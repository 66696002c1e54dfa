use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::app::board::DayBoard;
use crate::app::lock;
use crate::model::overrides::OverrideRecord;
use crate::model::task::Priority;

/// One armed override. Dropping it drops `_cancel`, which wakes the timer
/// thread and makes it exit without restoring anything.
#[derive(Debug)]
struct Pending {
    original: Priority,
    priority: Priority,
    expires_at: DateTime<Utc>,
    generation: u64,
    _cancel: mpsc::Sender<()>,
}

type PendingMap = Arc<Mutex<HashMap<NaiveDate, Pending>>>;

/// Temporary priority changes with a timed, cancellable revert.
///
/// Overrides are keyed by the day's date. Each one owns a single-shot timer
/// thread. Applying, cancelling, and the timer's restore all happen under
/// the pending-map lock, so a cancel that wins the lock strictly prevents
/// the restore.
#[derive(Debug)]
pub struct OverrideEngine {
    board: DayBoard,
    pending: PendingMap,
    next_generation: AtomicU64,
}

impl OverrideEngine {
    pub fn new(board: DayBoard) -> Self {
        OverrideEngine {
            board,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Set `date` to `priority` now and restore its earlier priority after
    /// `duration` unless cancelled first.
    ///
    /// Re-applying to a date that already has an override replaces it: the
    /// old timer never fires, and the value eventually restored is still the
    /// priority held before the first override. Returns `Ok(false)` if the
    /// board has no such day, and an `InvalidInput` error if the expiry
    /// would fall outside the representable date range.
    pub fn apply(&self, date: NaiveDate, priority: Priority, duration: Duration) -> io::Result<bool> {
        let mut pending = lock(&self.pending);
        let Some(current) = self.board.priority(date) else {
            tracing::debug!(%date, "override ignored, day not on board");
            return Ok(false);
        };
        let expires_at = TimeDelta::from_std(duration)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "override duration too large")
            })?;
        let original = pending.get(&date).map_or(current, |p| p.original);

        self.arm(&mut pending, date, original, priority, expires_at, duration)?;
        self.board.set_priority(date, priority);
        tracing::info!(%date, %original, %priority, ?duration, "priority override applied");
        Ok(true)
    }

    /// Re-install an override loaded from the ledger. The board is expected
    /// to already hold the overriding priority.
    pub fn rearm(&self, record: &OverrideRecord, now: DateTime<Utc>) -> io::Result<bool> {
        let mut pending = lock(&self.pending);
        if !self.board.contains(record.date) {
            return Ok(false);
        }
        self.arm(
            &mut pending,
            record.date,
            record.original,
            record.priority,
            record.expires_at,
            record.remaining(now),
        )?;
        tracing::debug!(date = %record.date, expires_at = %record.expires_at, "override re-armed");
        Ok(true)
    }

    /// Stop a pending override. The current priority is left as it is.
    /// Returns false if nothing was pending for `date`.
    pub fn cancel(&self, date: NaiveDate) -> bool {
        let removed = lock(&self.pending).remove(&date).is_some();
        if removed {
            tracing::info!(%date, "priority override cancelled");
        }
        removed
    }

    /// Stop every pending override without restoring anything.
    pub fn cancel_all(&self) {
        lock(&self.pending).clear();
    }

    pub fn is_pending(&self, date: NaiveDate) -> bool {
        lock(&self.pending).contains_key(&date)
    }

    /// Pending overrides as ledger records, in date order
    pub fn pending_records(&self) -> Vec<OverrideRecord> {
        let mut records: Vec<OverrideRecord> = lock(&self.pending)
            .iter()
            .map(|(date, p)| OverrideRecord {
                date: *date,
                original: p.original,
                priority: p.priority,
                expires_at: p.expires_at,
            })
            .collect();
        records.sort_by_key(|r| r.date);
        records
    }

    fn arm(
        &self,
        pending: &mut HashMap<NaiveDate, Pending>,
        date: NaiveDate,
        original: Priority,
        priority: Priority,
        expires_at: DateTime<Utc>,
        duration: Duration,
    ) -> io::Result<()> {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let map = Arc::clone(&self.pending);
        let board = self.board.clone();

        thread::Builder::new()
            .name(format!("override-{}", date))
            .spawn(move || {
                // Disconnected means the entry was removed: cancelled or replaced
                if !matches!(cancelled.recv_timeout(duration), Err(RecvTimeoutError::Timeout)) {
                    return;
                }
                let mut map = lock(&map);
                if map.get(&date).is_some_and(|p| p.generation == generation) {
                    map.remove(&date);
                    board.set_priority(date, original);
                    tracing::info!(%date, priority = %original, "priority override expired");
                }
            })?;

        // Replacing an entry drops its sender and cancels the old timer.
        pending.insert(
            date,
            Pending {
                original,
                priority,
                expires_at,
                generation,
                _cancel: cancel,
            },
        );
        Ok(())
    }
}

impl Drop for OverrideEngine {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
