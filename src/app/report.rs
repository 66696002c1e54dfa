use std::path::Path;
use std::sync::Arc;

use crate::app::events::{ChangeEvent, EventBus};
use crate::io::store::{DataStore, PersistenceError};
use crate::model::report::{MONTHS_PER_YEAR, MonthSummary, Period, ReportSummary, SortMetric};
use crate::model::works::{WorkStats, WorkTotals};
use crate::ops::aggregate::{self, MonthRange};
use crate::ops::works::{month_span, total_works};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("no record for month {0} (expected 1-12)")]
    UnknownMonth(u32),
    #[error("work title is empty")]
    EmptyWorkTitle,
    #[error("span ends before it starts ({start:?} > {end:?})")]
    ReversedSpan { start: (i32, u32), end: (i32, u32) },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Twelve month records plus the quarterly and yearly reports derived from them.
///
/// Every mutation recomputes both reports and publishes `ReportsUpdated`.
#[derive(Debug)]
pub struct ReportController {
    store: DataStore,
    events: Arc<EventBus>,
    months: Vec<MonthSummary>,
    quarterly: Vec<ReportSummary>,
    yearly: ReportSummary,
}

impl ReportController {
    /// Start with zeroed months, then load the stored report if there is one.
    pub fn open(store: DataStore, events: Arc<EventBus>) -> Result<Self, ReportError> {
        let mut controller = ReportController {
            store,
            events,
            months: MonthSummary::full_year(),
            quarterly: Vec::new(),
            yearly: ReportSummary::empty("Year"),
        };
        controller.load()?;
        controller.update_reports();
        Ok(controller)
    }

    pub fn months(&self) -> &[MonthSummary] {
        &self.months
    }

    pub fn month(&self, month: u32) -> Option<&MonthSummary> {
        self.months.iter().find(|m| m.month == month)
    }

    /// Q1..Q4 in calendar order
    pub fn quarterly(&self) -> &[ReportSummary] {
        &self.quarterly
    }

    pub fn yearly(&self) -> &ReportSummary {
        &self.yearly
    }

    pub fn set_profit(&mut self, month: u32, profit: f64) -> Result<(), ReportError> {
        self.month_mut(month)?.profit = profit;
        self.update_reports();
        Ok(())
    }

    pub fn set_views(&mut self, month: u32, views: u64) -> Result<(), ReportError> {
        self.month_mut(month)?.views = views;
        self.update_reports();
        Ok(())
    }

    fn month_mut(&mut self, month: u32) -> Result<&mut MonthSummary, ReportError> {
        self.months
            .iter_mut()
            .find(|m| m.month == month)
            .ok_or(ReportError::UnknownMonth(month))
    }

    pub fn save(&self) -> Result<(), ReportError> {
        self.store.save_report(&self.months)?;
        Ok(())
    }

    /// Reload from the data root. Returns whether the stored document was
    /// taken; a missing file or one without exactly 12 records changes nothing.
    pub fn load(&mut self) -> Result<bool, ReportError> {
        let loaded = self.store.load_report()?;
        Ok(self.replace_months(loaded))
    }

    /// Load a report document from any path, under the same 12-record rule.
    pub fn import(&mut self, path: &Path) -> Result<bool, ReportError> {
        let loaded = self.store.load_report_from(path)?;
        Ok(self.replace_months(loaded))
    }

    fn replace_months(&mut self, loaded: Option<Vec<MonthSummary>>) -> bool {
        match loaded {
            Some(mut months) if is_full_year(&months) => {
                months.sort_by_key(|m| m.month);
                self.months = months;
                self.update_reports();
                true
            }
            Some(months) => {
                tracing::warn!(
                    records = months.len(),
                    "report document ignored, expected one record for each month 1-12"
                );
                false
            }
            None => false,
        }
    }

    /// Edit one work's stats for `year`/`month` and save that month's works.
    /// An unknown title starts from zero.
    pub fn set_work(
        &self,
        year: i32,
        month: u32,
        title: &str,
        edit: impl FnOnce(&mut WorkStats),
    ) -> Result<WorkStats, ReportError> {
        if !(1..=12).contains(&month) {
            return Err(ReportError::UnknownMonth(month));
        }
        let title = title.trim();
        if title.is_empty() {
            return Err(ReportError::EmptyWorkTitle);
        }
        let mut works = self.store.load_works(year, month)?;
        let stats = works.entry(title.to_string()).or_default();
        edit(stats);
        let updated = stats.clone();
        self.store.save_works(year, month, &works)?;
        self.events.publish(ChangeEvent::ReportsUpdated);
        Ok(updated)
    }

    /// Works summed over every month from `start` to `end`, which may lie in
    /// different years. Most chapters done first.
    pub fn works_between(
        &self,
        start: (i32, u32),
        end: (i32, u32),
    ) -> Result<Vec<WorkTotals>, ReportError> {
        if start > end {
            return Err(ReportError::ReversedSpan { start, end });
        }
        let months = month_span(start, end)
            .into_iter()
            .map(|(year, month)| self.store.load_works(year, month))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(total_works(&months))
    }

    /// Aggregate the current months over any period.
    pub fn aggregate(
        &self,
        period: Period,
        sort_by: SortMetric,
        descending: bool,
        range: MonthRange,
    ) -> Vec<ReportSummary> {
        aggregate::aggregate(Some(&self.months), period, sort_by, descending, range)
    }

    fn update_reports(&mut self) {
        self.quarterly = aggregate::group(&self.months, Period::Quarter, MonthRange::default());
        self.yearly = aggregate::group(&self.months, Period::Year, MonthRange::default())
            .into_iter()
            .next()
            .unwrap_or_else(|| ReportSummary::empty("Year"));
        self.events.publish(ChangeEvent::ReportsUpdated);
    }
}

/// Exactly one record for each month 1..=12, in any order.
fn is_full_year(months: &[MonthSummary]) -> bool {
    let mut seen = [false; MONTHS_PER_YEAR];
    months.len() == MONTHS_PER_YEAR
        && months.iter().all(|m| {
            (1..=12).contains(&m.month) && !std::mem::replace(&mut seen[m.month as usize - 1], true)
        })
}
