use chrono::NaiveDate;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::io::recovery::RecoveryEntry;
use crate::model::overrides::OverrideRecord;
use crate::model::report::{MonthSummary, ReportSummary};
use crate::model::task::{DayTask, Priority};
use crate::model::works::WorkTotals;
use crate::ops::search::SearchHit;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct DayJson {
    pub date: NaiveDate,
    pub plan: String,
    pub done: String,
    pub priority: Priority,
    pub label: &'static str,
    pub color: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_until: Option<String>,
}

#[derive(Serialize)]
pub struct MonthJson {
    pub year: i32,
    pub month: u32,
    pub filter: &'static str,
    pub days: Vec<DayJson>,
}

#[derive(Serialize)]
pub struct ReportJson<'a> {
    pub months: &'a [MonthSummary],
    pub quarterly: &'a [ReportSummary],
    pub yearly: &'a ReportSummary,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    pub date: NaiveDate,
    pub field: &'static str,
    pub text: String,
}

pub fn day_to_json(day: &DayTask, pending: &[OverrideRecord]) -> DayJson {
    DayJson {
        date: day.date,
        plan: day.plan.clone(),
        done: day.done.clone(),
        priority: day.priority,
        label: day.priority.label(),
        color: day.priority.color(),
        override_until: pending
            .iter()
            .find(|r| r.date == day.date)
            .map(|r| r.expires_at.to_rfc3339()),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Pad `s` with spaces to `width` display columns.
fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    format!("{}{}", s, " ".repeat(width.saturating_sub(w)))
}

/// One line per day: date, priority, plan, done. Overridden days carry a `*`.
pub fn format_days(days: &[DayTask], pending: &[OverrideRecord]) -> Vec<String> {
    let plan_w = days
        .iter()
        .map(|d| UnicodeWidthStr::width(d.plan.as_str()))
        .max()
        .unwrap_or(0);

    days.iter()
        .map(|d| {
            let mark = if pending.iter().any(|r| r.date == d.date) {
                '*'
            } else {
                ' '
            };
            let line = format!(
                "{}  {}{} {}  {}  {}",
                d.date,
                d.priority,
                mark,
                pad(d.priority.label(), 6),
                pad(&d.plan, plan_w),
                d.done
            );
            line.trim_end().to_string()
        })
        .collect()
}

pub fn format_report_table(rows: &[ReportSummary]) -> Vec<String> {
    let mut lines = vec![format!("{:<8} {:>12} {:>10}", "PERIOD", "PROFIT", "VIEWS")];
    for r in rows {
        lines.push(format!("{:<8} {:>12.2} {:>10}", r.period, r.profit, r.views));
    }
    lines
}

pub fn format_month_table(months: &[MonthSummary]) -> Vec<String> {
    let mut lines = vec![format!("{:<8} {:>12} {:>10}", "MONTH", "PROFIT", "VIEWS")];
    for m in months {
        lines.push(format!("{:<8} {:>12.2} {:>10}", format!("{:02}", m.month), m.profit, m.views));
    }
    lines
}

/// Work totals with the title column padded to the widest title
pub fn format_works_table(rows: &[WorkTotals]) -> Vec<String> {
    let title_w = rows
        .iter()
        .map(|r| UnicodeWidthStr::width(r.work.as_str()))
        .max()
        .unwrap_or(0)
        .max(4);
    let mut lines = vec![format!(
        "{} {:>6} {:>6} {:>12} {:>10} {:>8}",
        pad("WORK", title_w),
        "PLAN",
        "DONE",
        "PROFIT",
        "VIEWS",
        "LIKES"
    )];
    for r in rows {
        lines.push(format!(
            "{} {:>6} {:>6} {:>12.2} {:>10} {:>8}",
            pad(&r.work, title_w),
            r.stats.plan,
            r.stats.done,
            r.stats.profit,
            r.stats.views,
            r.stats.likes
        ));
    }
    lines
}

pub fn format_override(record: &OverrideRecord) -> String {
    format!(
        "{}  {} -> {}  until {}",
        record.date,
        record.original,
        record.priority,
        record
            .expires_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
    )
}

/// `2025-03-14 plan: <text>` with the matched spans bracketed
pub fn format_search_hit(hit: &SearchHit, text: &str) -> String {
    let mut marked = String::new();
    let mut last = 0;
    for span in &hit.spans {
        marked.push_str(&text[last..span.start]);
        marked.push('[');
        marked.push_str(&text[span.clone()]);
        marked.push(']');
        last = span.end;
    }
    marked.push_str(&text[last..]);
    format!("{} {}: {}", hit.date, hit.field.as_str(), marked)
}

pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} {}: {}",
        entry
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        entry.category,
        entry.target,
        entry.error
    )];
    for line in entry.body.lines() {
        lines.push(format!("  {}", line));
    }
    lines
}
