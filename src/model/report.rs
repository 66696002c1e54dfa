use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of month records a report document must contain
pub const MONTHS_PER_YEAR: usize = 12;

/// Raw metrics for one month of the year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// 1..=12
    pub month: u32,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub views: u64,
}

impl MonthSummary {
    pub fn new(month: u32) -> Self {
        MonthSummary {
            month,
            profit: 0.0,
            views: 0,
        }
    }

    /// Twelve zeroed records, January first
    pub fn full_year() -> Vec<MonthSummary> {
        (1..=MONTHS_PER_YEAR as u32).map(MonthSummary::new).collect()
    }
}

/// A group of months reduced to totals. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub period: String,
    pub profit: f64,
    pub views: u64,
}

impl ReportSummary {
    pub fn empty(period: impl Into<String>) -> Self {
        ReportSummary {
            period: period.into(),
            profit: 0.0,
            views: 0,
        }
    }
}

/// How months are grouped by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Quarter,
    HalfYear,
    Year,
    Custom,
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quarter" | "q" => Ok(Period::Quarter),
            "half-year" | "half" | "h" => Ok(Period::HalfYear),
            "year" | "y" => Ok(Period::Year),
            "custom" => Ok(Period::Custom),
            other => Err(format!(
                "unknown period '{}' (expected quarter, half-year, year, or custom)",
                other
            )),
        }
    }
}

/// Metric a report is ordered by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMetric {
    #[default]
    Profit,
    Views,
}

impl FromStr for SortMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "profit" => Ok(SortMetric::Profit),
            "views" => Ok(SortMetric::Views),
            other => Err(format!(
                "unknown metric '{}' (expected profit or views)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_year_has_twelve_months_in_order() {
        let months = MonthSummary::full_year();
        assert_eq!(months.len(), MONTHS_PER_YEAR);
        assert_eq!(months[0].month, 1);
        assert_eq!(months[11].month, 12);
        assert!(months.iter().all(|m| m.profit == 0.0 && m.views == 0));
    }

    #[test]
    fn month_summary_accepts_integer_profit() {
        let m: MonthSummary = serde_json::from_str(r#"{"month":3,"profit":10,"views":7}"#).unwrap();
        assert_eq!(m.profit, 10.0);
        assert_eq!(m.views, 7);
    }

    #[test]
    fn period_and_metric_parse() {
        assert_eq!("half".parse::<Period>().unwrap(), Period::HalfYear);
        assert_eq!("custom".parse::<Period>().unwrap(), Period::Custom);
        assert!("week".parse::<Period>().is_err());
        assert_eq!("views".parse::<SortMetric>().unwrap(), SortMetric::Views);
    }
}
