use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};

use crate::app::board::DayBoard;
use crate::app::events::{ChangeEvent, EventBus};
use crate::app::overrides::OverrideEngine;
use crate::app::shutdown::{self, ShutdownOutcome};
use crate::io::store::{DataStore, PersistenceError};
use crate::model::overrides::OverrideRecord;
use crate::model::task::{DayTask, Priority, PriorityFilter};
use crate::ops::calendar_ops::{generate_month, merge_stored};
use crate::ops::priority::{filter_tasks, sort_tasks};

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("{0} is not in the selected month")]
    UnknownDate(NaiveDate),
    #[error("override duration {0:?} is too large")]
    DurationOutOfRange(Duration),
    #[error("could not start override timer: {0}")]
    Timer(#[source] std::io::Error),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Owns the days of the selected year/month.
///
/// Switching month persists the current days first, then generates a blank
/// month and lays the stored document (if any) over it. Overrides from the
/// ledger that fell due while the month was not loaded are reverted on load;
/// the rest are re-armed with their remaining time.
#[derive(Debug)]
pub struct CalendarController {
    store: DataStore,
    board: DayBoard,
    engine: OverrideEngine,
    year: i32,
    month: u32,
    filter: PriorityFilter,
    sorted: bool,
    /// Ledger entries for months other than the selected one
    other_overrides: Vec<OverrideRecord>,
}

impl CalendarController {
    /// A controller with nothing selected yet. Call [`select`](Self::select).
    pub fn new(store: DataStore, events: Arc<EventBus>) -> Self {
        let board = DayBoard::new(events);
        let engine = OverrideEngine::new(board.clone());
        CalendarController {
            store,
            board,
            engine,
            year: 0,
            month: 0,
            filter: PriorityFilter::default(),
            sorted: true,
            other_overrides: Vec::new(),
        }
    }

    /// A controller with `year`/`month` already loaded.
    pub fn open(
        store: DataStore,
        events: Arc<EventBus>,
        year: i32,
        month: u32,
    ) -> Result<Self, CalendarError> {
        let mut controller = Self::new(store, events);
        controller.select(year, month)?;
        Ok(controller)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn filter(&self) -> PriorityFilter {
        self.filter
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn set_filter(&mut self, filter: PriorityFilter) {
        self.filter = filter;
    }

    pub fn set_sorted(&mut self, sorted: bool) {
        self.sorted = sorted;
    }

    pub fn set_year(&mut self, year: i32) -> Result<(), CalendarError> {
        self.select(year, self.month.max(1))
    }

    pub fn set_month(&mut self, month: u32) -> Result<(), CalendarError> {
        self.select(self.year, month)
    }

    /// Switch to `year`/`month`. Selecting the current month is a no-op.
    ///
    /// The target month's document is read before anything changes. If it
    /// cannot be read, the previous selection stays loaded and untouched, so
    /// a later save never writes blank days over the unreadable file.
    pub fn select(&mut self, year: i32, month: u32) -> Result<(), CalendarError> {
        if year == self.year && month == self.month {
            return Ok(());
        }
        let generated =
            generate_month(year, month).ok_or(CalendarError::InvalidMonth { year, month })?;
        let stored = self.store.load_month(year, month)?;

        // Saving rewrites the ledger, so it is read afterwards.
        self.save()?;
        let ledger = self.store.load_overrides()?;

        self.engine.cancel_all();
        self.year = year;
        self.month = month;
        self.board.replace(match stored {
            Some(stored) => merge_stored(generated, stored),
            None => generated,
        });
        self.apply_ledger(ledger)?;
        self.board
            .events()
            .publish(ChangeEvent::MonthLoaded { year, month });
        Ok(())
    }

    /// Revert ledger overrides of the selected month that fell due and re-arm
    /// the rest. Entries for other months are kept for the next save.
    fn apply_ledger(&mut self, ledger: Vec<OverrideRecord>) -> Result<(), CalendarError> {
        let now = Utc::now();
        let (here, elsewhere): (Vec<OverrideRecord>, Vec<OverrideRecord>) = ledger
            .into_iter()
            .partition(|r| r.date.year() == self.year && r.date.month() == self.month);
        self.other_overrides = elsewhere;

        for record in here {
            if record.is_due(now) {
                self.board.set_priority(record.date, record.original);
                tracing::info!(date = %record.date, "override fell due while closed, restored");
            } else {
                self.engine
                    .rearm(&record, now)
                    .map_err(CalendarError::Timer)?;
            }
        }
        tracing::debug!(year = self.year, month = self.month, "month loaded");
        Ok(())
    }

    /// Persist the current days and the override ledger. Skipped while no
    /// month is selected.
    pub fn save(&self) -> Result<(), CalendarError> {
        if self.year == 0 || self.month == 0 {
            return Ok(());
        }
        self.store
            .save_month(self.year, self.month, &self.board.snapshot())?;

        let mut ledger = self.other_overrides.clone();
        ledger.extend(self.engine.pending_records());
        ledger.sort_by_key(|r| r.date);
        self.store.save_overrides(&ledger)?;
        Ok(())
    }

    /// All days of the month in date order
    pub fn days(&self) -> Vec<DayTask> {
        self.board.snapshot()
    }

    /// Days as displayed: filtered, then ordered by priority when sorting is on.
    pub fn visible(&self) -> Vec<DayTask> {
        let filtered = filter_tasks(self.board.snapshot(), self.filter);
        if self.sorted {
            sort_tasks(filtered)
        } else {
            filtered
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<DayTask> {
        self.board.get(date)
    }

    pub fn set_plan(&self, date: NaiveDate, plan: &str) -> Result<(), CalendarError> {
        self.edit(date, |d| d.plan = plan.to_string())
    }

    pub fn set_done(&self, date: NaiveDate, done: &str) -> Result<(), CalendarError> {
        self.edit(date, |d| d.done = done.to_string())
    }

    /// Set a priority directly. A pending override on the day still restores
    /// its own original value when it expires.
    pub fn set_priority(&self, date: NaiveDate, priority: Priority) -> Result<(), CalendarError> {
        if self.board.set_priority(date, priority) {
            Ok(())
        } else {
            Err(CalendarError::UnknownDate(date))
        }
    }

    fn edit(&self, date: NaiveDate, f: impl FnOnce(&mut DayTask)) -> Result<(), CalendarError> {
        if self.board.edit(date, f) {
            Ok(())
        } else {
            Err(CalendarError::UnknownDate(date))
        }
    }

    pub fn override_priority(
        &self,
        date: NaiveDate,
        priority: Priority,
        duration: Duration,
    ) -> Result<(), CalendarError> {
        match self.engine.apply(date, priority, duration) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CalendarError::UnknownDate(date)),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {
                Err(CalendarError::DurationOutOfRange(duration))
            }
            Err(e) => Err(CalendarError::Timer(e)),
        }
    }

    /// Returns false if no override was pending for `date`.
    pub fn cancel_override(&self, date: NaiveDate) -> bool {
        self.engine.cancel(date)
    }

    /// Pending overrides for the selected month
    pub fn pending_overrides(&self) -> Vec<OverrideRecord> {
        self.engine.pending_records()
    }

    /// Pending overrides across every month, as they would be saved
    pub fn all_overrides(&self) -> Vec<OverrideRecord> {
        let mut all = self.other_overrides.clone();
        all.extend(self.engine.pending_records());
        all.sort_by_key(|r| r.date);
        all
    }

    /// Best-effort final save, bounded by `timeout`.
    pub fn shutdown(self, timeout: Duration) -> ShutdownOutcome<CalendarError> {
        shutdown::flush_with_timeout(move || self.save(), timeout)
    }
}
