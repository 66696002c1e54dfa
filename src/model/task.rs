use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Urgency level of a day. `One` is the least urgent.
///
/// Stored as the integers 1..=4 in month documents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    #[default]
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::One, Priority::Two, Priority::Three, Priority::Four];

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Display colour used in legends and exported views
    pub fn color(self) -> &'static str {
        match self {
            Priority::One => "#00FF00",
            Priority::Two => "#008000",
            Priority::Three => "#FFFF00",
            Priority::Four => "#FFA500",
        }
    }

    /// Short human-readable name
    pub fn label(self) -> &'static str {
        match self {
            Priority::One => "Low",
            Priority::Two => "Medium",
            Priority::Three => "High",
            Priority::Four => "Urgent",
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.level()
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::One),
            2 => Ok(Priority::Two),
            3 => Ok(Priority::Three),
            4 => Ok(Priority::Four),
            other => Err(format!("priority must be 1-4, got {}", other)),
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    /// Accepts `1`..`4`, `one`..`four`, or the labels (`low`, `urgent`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "one" | "low" => Ok(Priority::One),
            "2" | "two" | "medium" => Ok(Priority::Two),
            "3" | "three" | "high" => Ok(Priority::Three),
            "4" | "four" | "urgent" => Ok(Priority::Four),
            other => Err(format!("unknown priority '{}' (expected 1-4)", other)),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Which priority levels are shown in the month view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityFilter {
    #[default]
    OneToFour,
    OneToTwo,
}

impl PriorityFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            PriorityFilter::OneToFour => "one-to-four",
            PriorityFilter::OneToTwo => "one-to-two",
        }
    }
}

impl FromStr for PriorityFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-to-four" | "1-4" | "all" => Ok(PriorityFilter::OneToFour),
            "one-to-two" | "1-2" => Ok(PriorityFilter::OneToTwo),
            other => Err(format!(
                "unknown filter '{}' (expected one-to-four or one-to-two)",
                other
            )),
        }
    }
}

/// One calendar day: what was planned, what got done, and how urgent it is.
///
/// The date is the task's identity; there is exactly one `DayTask` per day
/// of the selected month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTask {
    pub date: NaiveDate,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub done: String,
    #[serde(default)]
    pub priority: Priority,
}

impl DayTask {
    /// A blank day at the lowest urgency
    pub fn new(date: NaiveDate) -> Self {
        DayTask {
            date,
            plan: String::new(),
            done: String::new(),
            priority: Priority::default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.plan.is_empty() && self.done.is_empty()
    }
}
