use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Per-work numbers for one month: chapters planned and done, plus the
/// work's profit, views, and likes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkStats {
    #[serde(default)]
    pub plan: u64,
    #[serde(default)]
    pub done: u64,
    #[serde(default)]
    pub profit: f64,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub likes: u64,
}

impl WorkStats {
    pub fn add(&mut self, other: &WorkStats) {
        self.plan += other.plan;
        self.done += other.done;
        self.profit += other.profit;
        self.views += other.views;
        self.likes += other.likes;
    }
}

/// One month's works, keyed by title in the order they were entered.
pub type MonthWorks = IndexMap<String, WorkStats>;

/// A work's stats summed over a span of months
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkTotals {
    pub work: String,
    #[serde(flatten)]
    pub stats: WorkStats,
}
