use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, Utc};
use regex::Regex;

use crate::app::calendar::CalendarController;
use crate::app::events::EventBus;
use crate::app::report::ReportController;
use crate::app::shutdown::ShutdownOutcome;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, CONFIG_FILE};
use crate::io::lock::DataLock;
use crate::io::recovery;
use crate::io::store::DataStore;
use crate::model::config::PlannerConfig;
use crate::model::report::{Period, SortMetric};
use crate::model::task::PriorityFilter;
use crate::model::works::WorkTotals;
use crate::ops::aggregate::MonthRange;
use crate::ops::calendar_ops::parse_year_month;
use crate::ops::search::{MatchField, search_days};
use crate::ops::works::parse_span;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Upper bound on the final save of a calendar command
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved configuration and data location for one invocation
struct Context {
    config_path: PathBuf,
    config: PlannerConfig,
    store: DataStore,
}

fn load_context(config: Option<&Path>) -> Result<Context, Box<dyn std::error::Error>> {
    let config_path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = config_io::load_config(&config_path)?;
    let store = DataStore::new(config_io::resolve_data_root(&config_path, &config));
    tracing::debug!(root = %store.root().display(), "data root resolved");
    Ok(Context {
        config_path,
        config,
        store,
    })
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let ctx = load_context(cli.config.as_deref())?;

    match cli.command {
        Commands::Month(args) => cmd_month(&ctx, args, json),
        Commands::Set(args) => cmd_set(&ctx, args),
        Commands::Override(cmd) => match cmd.action {
            OverrideAction::Set(args) => cmd_override_set(&ctx, args, json),
            OverrideAction::Cancel(args) => cmd_override_cancel(&ctx, args),
            OverrideAction::List => cmd_override_list(&ctx, json),
        },
        Commands::Report(cmd) => match cmd.action {
            ReportAction::Show(args) => cmd_report_show(&ctx, args, json),
            ReportAction::Set(args) => cmd_report_set(&ctx, args),
            ReportAction::Import(args) => cmd_report_import(&ctx, args),
            ReportAction::Work(args) => cmd_report_work(&ctx, args, json),
            ReportAction::Works(args) => cmd_report_works(&ctx, args, json),
        },
        Commands::Search(args) => cmd_search(&ctx, args, json),
        Commands::Config(cmd) => cmd_config(&ctx, cmd, json),
        Commands::Recovery(args) => cmd_recovery(&ctx, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_calendar(ctx: &Context, year: i32, month: u32) -> Result<CalendarController, Box<dyn std::error::Error>> {
    let mut cal = CalendarController::open(ctx.store.clone(), Arc::new(EventBus::new()), year, month)?;
    cal.set_filter(ctx.config.calendar.filter);
    cal.set_sorted(ctx.config.calendar.sorted);
    Ok(cal)
}

/// Final save. Loading a month can restore overrides that fell due, so even
/// read commands go through here.
fn close_calendar(cal: CalendarController) -> CmdResult {
    match cal.shutdown(SHUTDOWN_TIMEOUT) {
        ShutdownOutcome::Flushed => Ok(()),
        ShutdownOutcome::Failed(e) => Err(e.into()),
        ShutdownOutcome::TimedOut => Err("timed out saving the calendar".into()),
    }
}

fn current_month() -> (i32, u32) {
    let today = Local::now().date_naive();
    (today.year(), today.month())
}

// ---------------------------------------------------------------------------
// Calendar commands
// ---------------------------------------------------------------------------

fn cmd_month(ctx: &Context, args: MonthArgs, json: bool) -> CmdResult {
    let (year, month) = match args.month.as_deref() {
        Some(s) => parse_year_month(s).ok_or_else(|| format!("invalid month '{}', expected YYYY-MM", s))?,
        None => current_month(),
    };
    let _lock = DataLock::acquire_default(ctx.store.root())?;
    let mut cal = open_calendar(ctx, year, month)?;
    if let Some(filter) = args.filter.as_deref() {
        cal.set_filter(filter.parse::<PriorityFilter>()?);
    }
    if args.unsorted {
        cal.set_sorted(false);
    }

    let days = cal.visible();
    let pending = cal.pending_overrides();
    if json {
        let output = MonthJson {
            year,
            month,
            filter: cal.filter().as_str(),
            days: days.iter().map(|d| day_to_json(d, &pending)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_days(&days, &pending) {
            println!("{}", line);
        }
    }
    close_calendar(cal)
}

fn cmd_set(ctx: &Context, args: SetArgs) -> CmdResult {
    if args.plan.is_none() && args.done.is_none() && args.priority.is_none() {
        return Err("nothing to set: pass --plan, --done, or --priority".into());
    }
    let _lock = DataLock::acquire_default(ctx.store.root())?;
    let cal = open_calendar(ctx, args.date.year(), args.date.month())?;

    if let Some(plan) = &args.plan {
        cal.set_plan(args.date, plan)?;
    }
    if let Some(done) = &args.done {
        cal.set_done(args.date, done)?;
    }
    if let Some(priority) = args.priority {
        cal.set_priority(args.date, priority)?;
        if let Some(record) = cal
            .pending_overrides()
            .into_iter()
            .find(|r| r.date == args.date)
        {
            eprintln!(
                "note: an override on {} will still restore priority {} when it expires",
                args.date, record.original
            );
        }
    }

    if let Some(day) = cal.day(args.date) {
        for line in format_days(&[day], &cal.pending_overrides()) {
            println!("{}", line);
        }
    }
    close_calendar(cal)
}

fn cmd_override_set(ctx: &Context, args: OverrideSetArgs, json: bool) -> CmdResult {
    let duration = args
        .duration
        .unwrap_or(Duration::from_secs(ctx.config.overrides.default_duration_secs));
    let _lock = DataLock::acquire_default(ctx.store.root())?;
    let cal = open_calendar(ctx, args.date.year(), args.date.month())?;
    cal.override_priority(args.date, args.priority, duration)?;

    if let Some(record) = cal
        .pending_overrides()
        .into_iter()
        .find(|r| r.date == args.date)
    {
        if json {
            println!("{}", serde_json::to_string_pretty(&record)?);
        } else {
            println!("{}", format_override(&record));
        }
    }
    close_calendar(cal)
}

fn cmd_override_cancel(ctx: &Context, args: OverrideCancelArgs) -> CmdResult {
    let _lock = DataLock::acquire_default(ctx.store.root())?;
    let cal = open_calendar(ctx, args.date.year(), args.date.month())?;
    if cal.cancel_override(args.date) {
        println!("cancelled override on {}", args.date);
    } else {
        println!("no override pending on {}", args.date);
    }
    close_calendar(cal)
}

fn cmd_override_list(ctx: &Context, json: bool) -> CmdResult {
    let now = Utc::now();
    let records: Vec<_> = ctx
        .store
        .load_overrides()?
        .into_iter()
        .filter(|r| !r.is_due(now))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("no pending overrides");
    } else {
        for record in &records {
            println!("{}", format_override(record));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Report commands
// ---------------------------------------------------------------------------

fn cmd_report_show(ctx: &Context, args: ReportShowArgs, json: bool) -> CmdResult {
    let report = ReportController::open(ctx.store.clone(), Arc::new(EventBus::new()))?;

    let period = match args.period.as_deref() {
        Some(p) => Some(p.parse::<Period>()?),
        None if args.from.is_some() || args.to.is_some() => Some(Period::Custom),
        None => None,
    };

    if let Some(period) = period {
        let sort_by: SortMetric = args.sort.parse()?;
        let rows = report.aggregate(
            period,
            sort_by,
            !args.asc,
            MonthRange::new(args.from, args.to),
        );
        if json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            for line in format_report_table(&rows) {
                println!("{}", line);
            }
        }
        return Ok(());
    }

    if json {
        let output = ReportJson {
            months: report.months(),
            quarterly: report.quarterly(),
            yearly: report.yearly(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_month_table(report.months()) {
            println!("{}", line);
        }
        println!();
        let mut summary = report.quarterly().to_vec();
        summary.push(report.yearly().clone());
        for line in format_report_table(&summary) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_report_set(ctx: &Context, args: ReportSetArgs) -> CmdResult {
    if args.profit.is_none() && args.views.is_none() {
        return Err("nothing to set: pass --profit and/or --views".into());
    }
    let _lock = DataLock::acquire_default(ctx.store.root())?;
    let mut report = ReportController::open(ctx.store.clone(), Arc::new(EventBus::new()))?;
    if let Some(profit) = args.profit {
        report.set_profit(args.month, profit)?;
    }
    if let Some(views) = args.views {
        report.set_views(args.month, views)?;
    }
    report.save()?;

    if let Some(m) = report.month(args.month) {
        println!("{:02}  profit {:.2}  views {}", m.month, m.profit, m.views);
    }
    Ok(())
}

fn cmd_report_import(ctx: &Context, args: ReportImportArgs) -> CmdResult {
    let _lock = DataLock::acquire_default(ctx.store.root())?;
    let mut report = ReportController::open(ctx.store.clone(), Arc::new(EventBus::new()))?;
    if !args.path.exists() {
        return Err(format!("no such file: {}", args.path.display()).into());
    }
    if report.import(&args.path)? {
        report.save()?;
        println!("imported 12 months from {}", args.path.display());
    } else {
        eprintln!(
            "ignored {}: a report document must hold exactly 12 month records",
            args.path.display()
        );
    }
    Ok(())
}

fn cmd_report_work(ctx: &Context, args: ReportWorkArgs, json: bool) -> CmdResult {
    if args.plan.is_none()
        && args.done.is_none()
        && args.profit.is_none()
        && args.views.is_none()
        && args.likes.is_none()
    {
        return Err("nothing to set: pass --plan, --done, --profit, --views, or --likes".into());
    }
    let (year, month) = parse_year_month(&args.month)
        .ok_or_else(|| format!("invalid month '{}', expected YYYY-MM", args.month))?;

    let _lock = DataLock::acquire_default(ctx.store.root())?;
    let report = ReportController::open(ctx.store.clone(), Arc::new(EventBus::new()))?;
    let stats = report.set_work(year, month, &args.title, |w| {
        if let Some(plan) = args.plan {
            w.plan = plan;
        }
        if let Some(done) = args.done {
            w.done = done;
        }
        if let Some(profit) = args.profit {
            w.profit = profit;
        }
        if let Some(views) = args.views {
            w.views = views;
        }
        if let Some(likes) = args.likes {
            w.likes = likes;
        }
    })?;

    let row = WorkTotals {
        work: args.title.trim().to_string(),
        stats,
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
    } else {
        for line in format_works_table(std::slice::from_ref(&row)) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_report_works(ctx: &Context, args: ReportWorksArgs, json: bool) -> CmdResult {
    let span = |s: &str| {
        parse_span(s).ok_or_else(|| format!("invalid span '{}', expected YYYY, YYYY-Qn, or YYYY-MM", s))
    };
    let (start, from_end) = span(&args.from)?;
    let end = match args.to.as_deref() {
        Some(to) => span(to)?.1,
        None => from_end,
    };

    let report = ReportController::open(ctx.store.clone(), Arc::new(EventBus::new()))?;
    let rows = report.works_between(start, end)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if rows.is_empty() {
        println!("no work stats between {}-{:02} and {}-{:02}", start.0, start.1, end.0, end.1);
    } else {
        for line in format_works_table(&rows) {
            println!("{}", line);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Search, config, recovery
// ---------------------------------------------------------------------------

fn cmd_search(ctx: &Context, args: SearchArgs, json: bool) -> CmdResult {
    let re = Regex::new(&args.pattern)?;
    let mut results = Vec::new();

    for (year, month) in ctx.store.list_months()? {
        if args.year.is_some_and(|y| y != year) {
            continue;
        }
        let Some(days) = ctx.store.load_month(year, month)? else {
            continue;
        };
        for hit in search_days(&re, &days) {
            if let Some(day) = days.iter().find(|d| d.date == hit.date) {
                let text = match hit.field {
                    MatchField::Plan => day.plan.clone(),
                    MatchField::Done => day.done.clone(),
                };
                results.push((hit, text));
            }
        }
    }

    if json {
        let hits: Vec<SearchHitJson> = results
            .into_iter()
            .map(|(hit, text)| SearchHitJson {
                date: hit.date,
                field: hit.field.as_str(),
                text,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else {
        for (hit, text) in &results {
            println!("{}", format_search_hit(hit, text));
        }
    }
    Ok(())
}

fn cmd_config(ctx: &Context, cmd: ConfigCmd, json: bool) -> CmdResult {
    match cmd.action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            if json {
                println!("{}", serde_json::to_string_pretty(&ctx.config)?);
            } else {
                println!("# config file: {}", ctx.config_path.display());
                println!("# data root:   {}", ctx.store.root().display());
                print!("{}", toml::to_string_pretty(&ctx.config)?);
            }
        }
        ConfigAction::SetDataRoot { path } => {
            config_io::set_data_root(&ctx.config_path, &path)?;
            println!("data_root = \"{}\"", path);
        }
        ConfigAction::SetFilter { filter } => {
            let filter: PriorityFilter = filter.parse()?;
            config_io::set_filter(&ctx.config_path, filter.as_str())?;
            println!("filter = \"{}\"", filter.as_str());
        }
    }
    Ok(())
}

fn cmd_recovery(ctx: &Context, args: RecoveryArgs) -> CmdResult {
    let entries = recovery::read_recovery_entries(ctx.store.root(), Some(args.limit));
    if entries.is_empty() {
        println!("recovery log is empty");
        return Ok(());
    }
    for entry in &entries {
        for line in format_recovery_entry(entry) {
            println!("{}", line);
        }
        println!();
    }
    Ok(())
}

