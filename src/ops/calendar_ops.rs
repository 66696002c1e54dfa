use chrono::{Datelike, NaiveDate};

use crate::model::task::DayTask;

/// Number of days in the given month, or `None` for an invalid year/month.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from((next - first).num_days()).ok()
}

/// One blank, lowest-urgency task for every day of the month.
pub fn generate_month(year: i32, month: u32) -> Option<Vec<DayTask>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(
        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(DayTask::new)
            .collect(),
    )
}

/// Lay stored days over a freshly generated month.
///
/// Days from the document replace the generated defaults by date; stored
/// entries that fall outside the month are dropped.
pub fn merge_stored(generated: Vec<DayTask>, stored: Vec<DayTask>) -> Vec<DayTask> {
    let mut days = generated;
    for day in stored {
        if let Some(slot) = days.iter_mut().find(|d| d.date == day.date) {
            *slot = day;
        }
    }
    days
}

/// Parse `YYYY-MM` into a year and month.
pub fn parse_year_month(s: &str) -> Option<(i32, u32)> {
    let (y, m) = s.split_once('-')?;
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    if (1..=12).contains(&month) {
        Some((year, month))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;

    #[test]
    fn month_lengths() {
        assert_eq!(days_in_month(2025, 1), Some(31));
        assert_eq!(days_in_month(2025, 2), Some(28));
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2025, 4), Some(30));
        assert_eq!(days_in_month(2025, 12), Some(31));
        assert_eq!(days_in_month(2025, 13), None);
        assert_eq!(days_in_month(2025, 0), None);
    }

    #[test]
    fn generate_one_task_per_day() {
        let days = generate_month(2024, 2).unwrap();
        assert_eq!(days.len(), 29);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(days[28].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(days.iter().all(|d| d.priority == Priority::One && d.is_blank()));
    }

    #[test]
    fn generate_invalid_month() {
        assert!(generate_month(2025, 0).is_none());
        assert!(generate_month(2025, 13).is_none());
    }

    #[test]
    fn merge_replaces_by_date() {
        let generated = generate_month(2025, 2).unwrap();
        let mut stored = DayTask::new(NaiveDate::from_ymd_opt(2025, 2, 10).unwrap());
        stored.plan = "draft".into();
        stored.priority = Priority::Three;
        let stray = DayTask::new(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());

        let days = merge_stored(generated, vec![stored.clone(), stray]);
        assert_eq!(days.len(), 28);
        assert_eq!(days[9], stored);
    }

    #[test]
    fn parse_year_month_formats() {
        assert_eq!(parse_year_month("2025-03"), Some((2025, 3)));
        assert_eq!(parse_year_month("2025-3"), Some((2025, 3)));
        assert_eq!(parse_year_month("2025-13"), None);
        assert_eq!(parse_year_month("march"), None);
    }
}
