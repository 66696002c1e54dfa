use serde::{Deserialize, Serialize};

use crate::model::task::PriorityFilter;

/// Configuration from planner.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Directory holding month documents and the report document
    #[serde(default = "default_data_root")]
    pub data_root: String,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub overrides: OverrideConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            data_root: default_data_root(),
            calendar: CalendarConfig::default(),
            overrides: OverrideConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub filter: PriorityFilter,
    /// Order the month view by priority instead of by date
    #[serde(default = "default_true")]
    pub sorted: bool,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            filter: PriorityFilter::default(),
            sorted: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Used when `plan override set` is given no `--for`
    #[serde(default = "default_override_secs")]
    pub default_duration_secs: u64,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        OverrideConfig {
            default_duration_secs: default_override_secs(),
        }
    }
}

fn default_data_root() -> String {
    "data".to_string()
}

fn default_true() -> bool {
    true
}

/// One day
fn default_override_secs() -> u64 {
    86_400
}
