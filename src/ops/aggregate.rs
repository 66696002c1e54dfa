use std::cmp::Ordering;

use indexmap::IndexMap;

use crate::model::report::{MonthSummary, Period, ReportSummary, SortMetric};

/// Inclusive month range used by [`Period::Custom`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl MonthRange {
    pub fn new(start: Option<u32>, end: Option<u32>) -> Self {
        MonthRange { start, end }
    }

    pub fn start_or_default(&self) -> u32 {
        self.start.unwrap_or(1)
    }

    pub fn end_or_default(&self) -> u32 {
        self.end.unwrap_or(12)
    }

    fn contains(&self, month: u32) -> bool {
        month >= self.start_or_default() && month <= self.end_or_default()
    }

    fn label(&self) -> String {
        format!("{:02}-{:02}", self.start_or_default(), self.end_or_default())
    }
}

/// Group month records by `period` and sum each group, in first-seen order.
///
/// `range` only matters for [`Period::Custom`]. [`Period::Year`] always
/// yields exactly one row, zeroed for an empty source; the other periods
/// never produce a group with no members.
pub fn group(source: &[MonthSummary], period: Period, range: MonthRange) -> Vec<ReportSummary> {
    let mut groups: IndexMap<String, ReportSummary> = IndexMap::new();
    if period == Period::Year {
        groups.insert("Year".to_string(), ReportSummary::empty("Year"));
    }

    for m in source {
        let label = match period {
            Period::Quarter => format!("Q{}", (m.month.saturating_sub(1)) / 3 + 1),
            Period::HalfYear => format!("H{}", (m.month.saturating_sub(1)) / 6 + 1),
            Period::Year => "Year".to_string(),
            Period::Custom => {
                if !range.contains(m.month) {
                    continue;
                }
                range.label()
            }
        };
        let entry = groups
            .entry(label.clone())
            .or_insert_with(|| ReportSummary::empty(label));
        entry.profit += m.profit;
        entry.views += m.views;
    }

    groups.into_values().collect()
}

/// Group, sum, and order month records.
///
/// An absent source yields an empty report. Ordering is stable, so groups
/// with equal metrics stay in the order they were first seen.
pub fn aggregate(
    source: Option<&[MonthSummary]>,
    period: Period,
    sort_by: SortMetric,
    descending: bool,
    range: MonthRange,
) -> Vec<ReportSummary> {
    let Some(source) = source else {
        return Vec::new();
    };

    let mut result = group(source, period, range);
    result.sort_by(|a, b| {
        let ord = compare_by(a, b, sort_by);
        if descending { ord.reverse() } else { ord }
    });
    result
}

fn compare_by(a: &ReportSummary, b: &ReportSummary, metric: SortMetric) -> Ordering {
    match metric {
        SortMetric::Profit => a.profit.total_cmp(&b.profit),
        SortMetric::Views => a.views.cmp(&b.views),
    }
}
