use indexmap::IndexMap;

use crate::model::works::{MonthWorks, WorkStats, WorkTotals};

/// Every `(year, month)` from `start` to `end` inclusive, crossing year
/// boundaries. Empty when `start` is after `end`.
pub fn month_span(start: (i32, u32), end: (i32, u32)) -> Vec<(i32, u32)> {
    let mut months = Vec::new();
    let (mut year, mut month) = start;
    while (year, month) <= end {
        months.push((year, month));
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    months
}

/// Parse a span shorthand into its first and last month:
/// `2025` (whole year), `2025-Q2` (one quarter), or `2025-03` (one month).
pub fn parse_span(s: &str) -> Option<((i32, u32), (i32, u32))> {
    let s = s.trim();
    match s.split_once('-') {
        None => {
            let year: i32 = s.parse().ok()?;
            Some(((year, 1), (year, 12)))
        }
        Some((y, rest)) => {
            let year: i32 = y.parse().ok()?;
            if let Some(q) = rest.strip_prefix('Q').or_else(|| rest.strip_prefix('q')) {
                let quarter: u32 = q.parse().ok()?;
                if !(1..=4).contains(&quarter) {
                    return None;
                }
                let first = (quarter - 1) * 3 + 1;
                Some(((year, first), (year, first + 2)))
            } else {
                let month: u32 = rest.parse().ok()?;
                (1..=12)
                    .contains(&month)
                    .then_some(((year, month), (year, month)))
            }
        }
    }
}

/// Sum works across months, ordered by chapters done (most first).
/// Works with equal `done` keep the order they were first seen in.
pub fn total_works<'a>(months: impl IntoIterator<Item = &'a MonthWorks>) -> Vec<WorkTotals> {
    let mut totals: IndexMap<&str, WorkStats> = IndexMap::new();
    for works in months {
        for (name, stats) in works {
            totals.entry(name.as_str()).or_default().add(stats);
        }
    }

    let mut result: Vec<WorkTotals> = totals
        .into_iter()
        .map(|(work, stats)| WorkTotals {
            work: work.to_string(),
            stats,
        })
        .collect();
    result.sort_by(|a, b| b.stats.done.cmp(&a.stats.done));
    result
}
