//! Integration tests for the `plan` CLI.
//!
//! Each test writes a planner.toml into a temp directory, runs `plan` as a
//! subprocess against it, and checks stdout and/or the stored documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

/// Get the path to the built `plan` binary.
fn plan_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("plan");
    path
}

/// Write a config whose data root is `<root>/data`.
fn create_config(root: &Path) -> PathBuf {
    let config = root.join("planner.toml");
    fs::write(&config, "data_root = \"data\"\n").unwrap();
    config
}

/// Run `plan` with the given args, returning (stdout, stderr, success).
fn run_plan(root: &Path, args: &[&str]) -> (String, String, bool) {
    let config = root.join("planner.toml");
    let output = Command::new(plan_bin())
        .arg("--config")
        .arg(&config)
        .args(args)
        .current_dir(root)
        .env_remove("PLANNER_DATA_ROOT")
        .env_remove("PLANNER_LOG")
        .output()
        .expect("failed to run plan");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `plan` expecting success, return stdout.
fn run_plan_ok(root: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_plan(root, args);
    if !success {
        panic!(
            "plan {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

fn run_json(root: &Path, args: &[&str]) -> serde_json::Value {
    let mut args = args.to_vec();
    args.push("--json");
    let out = run_plan_ok(root, &args);
    serde_json::from_str(&out).unwrap_or_else(|e| panic!("bad json ({}): {}", e, out))
}

fn setup() -> tempfile::TempDir {
    let tmp = tempfile::TempDir::new().unwrap();
    create_config(tmp.path());
    tmp
}

/// Priority of `date` as shown by `plan month --json`
fn priority_of(root: &Path, month: &str, date: &str) -> u64 {
    let value = run_json(root, &["month", month, "--unsorted"]);
    value["days"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["date"] == date)
        .unwrap_or_else(|| panic!("{} not in {}", date, month))["priority"]
        .as_u64()
        .unwrap()
}

// ---------------------------------------------------------------------------
// Month view
// ---------------------------------------------------------------------------

#[test]
fn test_month_lists_every_day() {
    let tmp = setup();
    let value = run_json(tmp.path(), &["month", "2024-02"]);
    assert_eq!(value["year"], 2024);
    assert_eq!(value["month"], 2);
    assert_eq!(value["filter"], "one-to-four");
    let days = value["days"].as_array().unwrap();
    assert_eq!(days.len(), 29);
    assert!(days.iter().all(|d| d["priority"] == 1));
}

#[test]
fn test_month_is_persisted_after_viewing() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["month", "2025-04"]);
    let stored = tmp.path().join("data/2025/04.json");
    assert!(stored.exists());
    let days: serde_json::Value = serde_json::from_str(&fs::read_to_string(stored).unwrap()).unwrap();
    assert_eq!(days.as_array().unwrap().len(), 30);
}

#[test]
fn test_invalid_month_fails() {
    let tmp = setup();
    let (_, stderr, success) = run_plan(tmp.path(), &["month", "2025-13"]);
    assert!(!success);
    assert!(stderr.contains("invalid month"));
}

#[test]
fn test_month_sorted_by_priority() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["set", "2025-04-01", "--priority", "4"]);
    run_plan_ok(tmp.path(), &["set", "2025-04-02", "--priority", "2"]);

    let sorted = run_json(tmp.path(), &["month", "2025-04"]);
    let dates: Vec<&str> = sorted["days"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["date"].as_str().unwrap())
        .collect();
    assert_eq!(dates[0], "2025-04-03");
    assert_eq!(dates[28], "2025-04-02");
    assert_eq!(dates[29], "2025-04-01");

    let unsorted = run_json(tmp.path(), &["month", "2025-04", "--unsorted"]);
    assert_eq!(unsorted["days"][0]["date"], "2025-04-01");
}

#[test]
fn test_month_filter_one_to_two() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["set", "2025-04-10", "--priority", "high"]);
    run_plan_ok(tmp.path(), &["set", "2025-04-11", "--priority", "medium"]);

    let value = run_json(tmp.path(), &["month", "2025-04", "--filter", "1-2"]);
    let days = value["days"].as_array().unwrap();
    assert_eq!(days.len(), 29);
    assert!(days.iter().all(|d| d["priority"].as_u64().unwrap() <= 2));
    assert!(!days.iter().any(|d| d["date"] == "2025-04-10"));
}

// ---------------------------------------------------------------------------
// Editing days
// ---------------------------------------------------------------------------

#[test]
fn test_set_plan_and_done() {
    let tmp = setup();
    let out = run_plan_ok(
        tmp.path(),
        &["set", "2025-03-14", "--plan", "draft post", "--done", "outline"],
    );
    assert!(out.contains("2025-03-14"));
    assert!(out.contains("draft post"));

    let value = run_json(tmp.path(), &["month", "2025-03", "--unsorted"]);
    let day = &value["days"][13];
    assert_eq!(day["date"], "2025-03-14");
    assert_eq!(day["plan"], "draft post");
    assert_eq!(day["done"], "outline");
    assert_eq!(day["label"], "Low");
}

#[test]
fn test_set_without_fields_fails() {
    let tmp = setup();
    let (_, stderr, success) = run_plan(tmp.path(), &["set", "2025-03-14"]);
    assert!(!success);
    assert!(stderr.contains("nothing to set"));
}

#[test]
fn test_set_rejects_bad_priority() {
    let tmp = setup();
    let (_, _, success) = run_plan(tmp.path(), &["set", "2025-03-14", "--priority", "5"]);
    assert!(!success);
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

#[test]
fn test_override_set_list_cancel() {
    let tmp = setup();
    let record = run_json(
        tmp.path(),
        &["override", "set", "2025-05-02", "urgent", "--for", "1h"],
    );
    assert_eq!(record["date"], "2025-05-02");
    assert_eq!(record["original"], 1);
    assert_eq!(record["priority"], 4);

    let listed = run_json(tmp.path(), &["override", "list"]);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(priority_of(tmp.path(), "2025-05", "2025-05-02"), 4);

    let out = run_plan_ok(tmp.path(), &["override", "cancel", "2025-05-02"]);
    assert!(out.contains("cancelled"));
    let out = run_plan_ok(tmp.path(), &["override", "list"]);
    assert!(out.contains("no pending overrides"));

    // cancelling keeps the overriding priority
    assert_eq!(priority_of(tmp.path(), "2025-05", "2025-05-02"), 4);
}

#[test]
fn test_override_reverts_after_expiry() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["set", "2025-05-03", "--priority", "2"]);
    run_plan_ok(
        tmp.path(),
        &["override", "set", "2025-05-03", "4", "--for", "1s"],
    );
    thread::sleep(Duration::from_millis(1_500));

    assert_eq!(priority_of(tmp.path(), "2025-05", "2025-05-03"), 2);
    let listed = run_json(tmp.path(), &["override", "list"]);
    assert!(listed.as_array().unwrap().is_empty());
    assert!(!tmp.path().join("data/overrides.json").exists());
}

#[test]
fn test_override_marked_in_month_view() {
    let tmp = setup();
    run_plan_ok(
        tmp.path(),
        &["override", "set", "2025-05-04", "3", "--for", "2h"],
    );
    let out = run_plan_ok(tmp.path(), &["month", "2025-05", "--unsorted"]);
    let line = out
        .lines()
        .find(|l| l.starts_with("2025-05-04"))
        .unwrap();
    assert!(line.contains("3*"));

    let value = run_json(tmp.path(), &["month", "2025-05", "--unsorted"]);
    assert!(value["days"][3]["override_until"].is_string());
    assert!(value["days"][4].get("override_until").is_none());
}

#[test]
fn test_override_cancel_without_pending() {
    let tmp = setup();
    let out = run_plan_ok(tmp.path(), &["override", "cancel", "2025-05-02"]);
    assert!(out.contains("no override pending"));
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[test]
fn test_report_set_and_show() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["report", "set", "1", "--profit", "10"]);
    run_plan_ok(tmp.path(), &["report", "set", "2", "--profit", "20", "--views", "5"]);
    run_plan_ok(tmp.path(), &["report", "set", "3", "--profit", "30"]);

    let value = run_json(tmp.path(), &["report", "show"]);
    assert_eq!(value["months"].as_array().unwrap().len(), 12);
    assert_eq!(value["quarterly"][0]["period"], "Q1");
    assert_eq!(value["quarterly"][0]["profit"], 60.0);
    assert_eq!(value["quarterly"][0]["views"], 5);
    assert_eq!(value["yearly"]["period"], "Year");
    assert_eq!(value["yearly"]["profit"], 60.0);

    let out = run_plan_ok(tmp.path(), &["report", "show"]);
    assert!(out.contains("MONTH"));
    assert!(out.contains("Q1"));
    assert!(out.contains("Year"));
}

#[test]
fn test_report_custom_period() {
    let tmp = setup();
    for (m, p) in [("4", "1"), ("5", "2"), ("6", "3"), ("7", "100")] {
        run_plan_ok(tmp.path(), &["report", "set", m, "--profit", p]);
    }
    let value = run_json(tmp.path(), &["report", "show", "--from", "4", "--to", "6"]);
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["period"], "04-06");
    assert_eq!(rows[0]["profit"], 6.0);
}

#[test]
fn test_report_half_year_ascending() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["report", "set", "2", "--views", "9"]);
    run_plan_ok(tmp.path(), &["report", "set", "8", "--views", "3"]);
    let value = run_json(
        tmp.path(),
        &["report", "show", "--period", "half-year", "--sort", "views", "--asc"],
    );
    let periods: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["period"].as_str().unwrap())
        .collect();
    assert_eq!(periods, vec!["H2", "H1"]);
}

#[test]
fn test_report_set_unknown_month_fails() {
    let tmp = setup();
    let (_, stderr, success) = run_plan(tmp.path(), &["report", "set", "13", "--views", "1"]);
    assert!(!success);
    assert!(stderr.contains("13"));
}

#[test]
fn test_report_import_requires_twelve_records() {
    let tmp = setup();
    let short: Vec<serde_json::Value> = (1..=11)
        .map(|m| serde_json::json!({ "month": m, "profit": 1.0, "views": 1 }))
        .collect();
    let path = tmp.path().join("short.json");
    fs::write(&path, serde_json::to_string(&short).unwrap()).unwrap();

    let (_, stderr, success) = run_plan(tmp.path(), &["report", "import", "short.json"]);
    assert!(success);
    assert!(stderr.contains("ignored"));
    assert!(!tmp.path().join("data/report.json").exists());

    let full: Vec<serde_json::Value> = (1..=12)
        .map(|m| serde_json::json!({ "month": m, "profit": 1.0, "views": 1 }))
        .collect();
    fs::write(&path, serde_json::to_string(&full).unwrap()).unwrap();
    let out = run_plan_ok(tmp.path(), &["report", "import", "short.json"]);
    assert!(out.contains("imported 12 months"));

    let value = run_json(tmp.path(), &["report", "show"]);
    assert_eq!(value["yearly"]["profit"], 12.0);
    assert_eq!(value["yearly"]["views"], 12);
}

// ---------------------------------------------------------------------------
// Search, config, recovery
// ---------------------------------------------------------------------------

#[test]
fn test_search_across_months() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["set", "2024-12-31", "--plan", "year review"]);
    run_plan_ok(tmp.path(), &["set", "2025-01-02", "--done", "review notes"]);
    run_plan_ok(tmp.path(), &["set", "2025-01-03", "--plan", "unrelated"]);

    let hits = run_json(tmp.path(), &["search", "review"]);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0]["date"], "2024-12-31");
    assert_eq!(hits[0]["field"], "plan");
    assert_eq!(hits[1]["field"], "done");

    let out = run_plan_ok(tmp.path(), &["search", "review", "--year", "2025"]);
    assert_eq!(out.trim(), "2025-01-02 done: [review] notes");
}

#[test]
fn test_search_bad_regex_fails() {
    let tmp = setup();
    let (_, _, success) = run_plan(tmp.path(), &["search", "("]);
    assert!(!success);
}

#[test]
fn test_config_set_filter_applies_to_month() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["config", "set-filter", "one-to-two"]);
    let config = run_json(tmp.path(), &["config", "show"]);
    assert_eq!(config["calendar"]["filter"], "one-to-two");
    assert_eq!(config["data_root"], "data");

    // the edit keeps the existing keys
    let text = fs::read_to_string(tmp.path().join("planner.toml")).unwrap();
    assert!(text.contains("data_root = \"data\""));

    run_plan_ok(tmp.path(), &["set", "2025-06-01", "--priority", "3"]);
    let value = run_json(tmp.path(), &["month", "2025-06"]);
    assert_eq!(value["filter"], "one-to-two");
    assert_eq!(value["days"].as_array().unwrap().len(), 29);
}

#[test]
fn test_config_set_data_root() {
    let tmp = setup();
    run_plan_ok(tmp.path(), &["config", "set-data-root", "elsewhere"]);
    run_plan_ok(tmp.path(), &["set", "2025-06-01", "--plan", "x"]);
    assert!(tmp.path().join("elsewhere/2025/06.json").exists());
    assert!(!tmp.path().join("data").exists());
}

#[test]
fn test_config_rejects_unknown_filter() {
    let tmp = setup();
    let (_, _, success) = run_plan(tmp.path(), &["config", "set-filter", "three-only"]);
    assert!(!success);
}

#[test]
fn test_malformed_month_goes_to_recovery() {
    let tmp = setup();
    let dir = tmp.path().join("data/2025");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("07.json"), "[{\"date\": \"2025-07-01\",").unwrap();

    let (_, stderr, success) = run_plan(tmp.path(), &["month", "2025-07"]);
    assert!(!success);
    assert!(stderr.contains("2025/07.json"));

    let out = run_plan_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("parse"));
    assert!(out.contains("[{\"date\": \"2025-07-01\","));
}

#[test]
fn test_recovery_empty() {
    let tmp = setup();
    let out = run_plan_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("recovery log is empty"));
}

// ---------------------------------------------------------------------------
// Override durations out of range
// ---------------------------------------------------------------------------

#[test]
fn test_override_duration_overflowing_seconds_fails_cleanly() {
    let tmp = setup();
    let (_, stderr, success) = run_plan(
        tmp.path(),
        &["override", "set", "2025-07-01", "4", "--for", "999999999999999d"],
    );
    assert!(!success);
    assert!(stderr.contains("too large"), "stderr: {}", stderr);
    assert!(!stderr.contains("panicked"));
}

#[test]
fn test_override_expiry_past_calendar_fails_cleanly() {
    let tmp = setup();
    let (_, stderr, success) = run_plan(
        tmp.path(),
        &["override", "set", "2025-07-01", "4", "--for", "100000000000d"],
    );
    assert!(!success);
    assert!(stderr.contains("too large"), "stderr: {}", stderr);
    assert!(!stderr.contains("panicked"));

    // nothing was applied or recorded
    assert_eq!(priority_of(tmp.path(), "2025-07", "2025-07-01"), 1);
    let list = run_json(tmp.path(), &["override", "list"]);
    assert!(list.as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Work stats
// ---------------------------------------------------------------------------

#[test]
fn test_report_works_across_new_year() {
    let tmp = setup();
    run_plan_ok(
        tmp.path(),
        &["report", "work", "2024-12", "Ember Road", "--done", "4", "--views", "100"],
    );
    run_plan_ok(
        tmp.path(),
        &["report", "work", "2024-12", "Glass Tide", "--done", "9"],
    );
    run_plan_ok(
        tmp.path(),
        &["report", "work", "2025-01", "Ember Road", "--done", "8", "--profit", "2.5"],
    );
    assert!(tmp.path().join("data/2024/top_12.json").exists());
    assert!(tmp.path().join("data/2025/top_01.json").exists());

    let value = run_json(tmp.path(), &["report", "works", "2024-12", "2025-01"]);
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["work"], "Ember Road");
    assert_eq!(rows[0]["done"], 12);
    assert_eq!(rows[0]["views"], 100);
    assert_eq!(rows[0]["profit"], 2.5);
    assert_eq!(rows[1]["work"], "Glass Tide");

    // one month only
    let value = run_json(tmp.path(), &["report", "works", "2025-01"]);
    assert_eq!(value.as_array().unwrap().len(), 1);

    // 2024 alone: Glass Tide leads with 9 done
    let out = run_plan_ok(tmp.path(), &["report", "works", "2024"]);
    let glass = out.find("Glass Tide").unwrap();
    let ember = out.find("Ember Road").unwrap();
    assert!(glass < ember);
}

#[test]
fn test_report_work_needs_a_field() {
    let tmp = setup();
    let (_, stderr, success) = run_plan(tmp.path(), &["report", "work", "2025-01", "Ember Road"]);
    assert!(!success);
    assert!(stderr.contains("nothing to set"));
}

#[test]
fn test_report_works_empty_span() {
    let tmp = setup();
    let out = run_plan_ok(tmp.path(), &["report", "works", "2025-Q3"]);
    assert!(out.contains("no work stats between 2025-07 and 2025-09"));
}

#[test]
fn test_report_year_period_on_fresh_root() {
    let tmp = setup();
    let value = run_json(tmp.path(), &["report", "show", "--period", "year"]);
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["period"], "Year");
    assert_eq!(rows[0]["profit"], 0.0);
}
