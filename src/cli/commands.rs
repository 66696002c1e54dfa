use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::model::task::Priority;

#[derive(Parser)]
#[command(name = "plan", about = concat!("planner v", env!("CARGO_PKG_VERSION"), " - a month of days, one priority each"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ./planner.toml)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the days of a month
    Month(MonthArgs),
    /// Edit a day's plan, done text, or priority
    Set(SetArgs),
    /// Temporary priority overrides
    Override(OverrideCmd),
    /// Monthly profit/view metrics and period summaries
    Report(ReportCmd),
    /// Search plan and done text by regex
    Search(SearchArgs),
    /// Show or edit planner.toml
    Config(ConfigCmd),
    /// Show content that could not be saved or read
    Recovery(RecoveryArgs),
}

// ---------------------------------------------------------------------------
// Calendar args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct MonthArgs {
    /// Month as YYYY-MM (default: current month)
    pub month: Option<String>,
    /// Priority filter: one-to-four or one-to-two (default: from config)
    #[arg(long)]
    pub filter: Option<String>,
    /// Keep date order instead of ordering by priority
    #[arg(long)]
    pub unsorted: bool,
}

#[derive(Args)]
pub struct SetArgs {
    /// Day to edit (YYYY-MM-DD)
    pub date: NaiveDate,
    /// What is planned for the day
    #[arg(long)]
    pub plan: Option<String>,
    /// What actually got done
    #[arg(long)]
    pub done: Option<String>,
    /// Priority 1-4 (or low, medium, high, urgent)
    #[arg(long)]
    pub priority: Option<Priority>,
}

#[derive(Args)]
pub struct OverrideCmd {
    #[command(subcommand)]
    pub action: OverrideAction,
}

#[derive(Subcommand)]
pub enum OverrideAction {
    /// Raise or lower a day's priority until the duration runs out
    Set(OverrideSetArgs),
    /// Stop an override, keeping the current priority
    Cancel(OverrideCancelArgs),
    /// List pending overrides
    List,
}

#[derive(Args)]
pub struct OverrideSetArgs {
    /// Day to override (YYYY-MM-DD)
    pub date: NaiveDate,
    /// Priority while the override lasts
    pub priority: Priority,
    /// How long the override lasts, e.g. 90s, 45m, 2h, 1d (default: from config)
    #[arg(long = "for", value_parser = parse_duration)]
    pub duration: Option<Duration>,
}

#[derive(Args)]
pub struct OverrideCancelArgs {
    /// Day whose override to cancel (YYYY-MM-DD)
    pub date: NaiveDate,
}

// ---------------------------------------------------------------------------
// Report args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ReportCmd {
    #[command(subcommand)]
    pub action: ReportAction,
}

#[derive(Subcommand)]
pub enum ReportAction {
    /// Show months with quarterly and yearly totals, or one aggregated period
    Show(ReportShowArgs),
    /// Set a month's profit and/or views
    Set(ReportSetArgs),
    /// Replace all months from a report document (must hold 12 records)
    Import(ReportImportArgs),
    /// Set one work's stats for a month
    Work(ReportWorkArgs),
    /// Sum work stats over a span of months, most chapters done first
    Works(ReportWorksArgs),
}

#[derive(Args)]
pub struct ReportShowArgs {
    /// Aggregate by quarter, half-year, year, or custom
    #[arg(long)]
    pub period: Option<String>,
    /// First month of a custom period
    #[arg(long)]
    pub from: Option<u32>,
    /// Last month of a custom period
    #[arg(long)]
    pub to: Option<u32>,
    /// Order aggregated rows by profit or views
    #[arg(long, default_value = "profit")]
    pub sort: String,
    /// Ascending instead of descending order
    #[arg(long)]
    pub asc: bool,
}

#[derive(Args)]
pub struct ReportSetArgs {
    /// Month number 1-12
    pub month: u32,
    #[arg(long)]
    pub profit: Option<f64>,
    #[arg(long)]
    pub views: Option<u64>,
}

#[derive(Args)]
pub struct ReportImportArgs {
    /// Path to a report JSON document
    pub path: PathBuf,
}

#[derive(Args)]
pub struct ReportWorkArgs {
    /// Month as YYYY-MM
    pub month: String,
    /// Work title
    pub title: String,
    /// Chapters planned
    #[arg(long)]
    pub plan: Option<u64>,
    /// Chapters done
    #[arg(long)]
    pub done: Option<u64>,
    #[arg(long)]
    pub profit: Option<f64>,
    #[arg(long)]
    pub views: Option<u64>,
    #[arg(long)]
    pub likes: Option<u64>,
}

#[derive(Args)]
pub struct ReportWorksArgs {
    /// First month: YYYY, YYYY-Qn, or YYYY-MM
    pub from: String,
    /// Last month, same forms (default: end of FROM)
    pub to: Option<String>,
}

// ---------------------------------------------------------------------------
// Other args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SearchArgs {
    /// Regex pattern to search for
    pub pattern: String,
    /// Limit search to one year
    #[arg(long)]
    pub year: Option<i32>,
}

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Change where month and report documents are stored
    SetDataRoot { path: String },
    /// Change the default month-view filter
    SetFilter { filter: String },
}

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show
    #[arg(long, default_value = "10")]
    pub limit: usize,
}

/// Parse `90`, `90s`, `45m`, `2h`, or `1d` into a duration.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => s.split_at(i),
        None => (s, "s"),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{}'", s))?;
    let scale: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        _ => return Err(format!("invalid duration unit in '{}' (use s, m, h, d)", s)),
    };
    n.checked_mul(scale)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{}'", s))
}
