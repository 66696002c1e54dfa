use std::ops::Range;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::task::DayTask;

/// Which text of a day matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Plan,
    Done,
}

impl MatchField {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchField::Plan => "plan",
            MatchField::Done => "done",
        }
    }
}

/// A search hit in one field of one day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub date: NaiveDate,
    pub field: MatchField,
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search the plan and done text of each day, in day order.
pub fn search_days(re: &Regex, days: &[DayTask]) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    for day in days {
        for (field, text) in [(MatchField::Plan, &day.plan), (MatchField::Done, &day.done)] {
            let spans = find_matches(re, text);
            if !spans.is_empty() {
                hits.push(SearchHit {
                    date: day.date,
                    field,
                    spans,
                });
            }
        }
    }
    hits
}
