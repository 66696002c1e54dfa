use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::overrides::OverrideRecord;
use crate::model::report::MonthSummary;
use crate::model::task::DayTask;
use crate::model::works::MonthWorks;

const REPORT_FILE: &str = "report.json";
const OVERRIDES_FILE: &str = "overrides.json";

/// Error type for reading and writing planner documents
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// JSON documents under one data root:
///
/// ```text
/// <root>/2025/03.json     month of DayTasks
/// <root>/2025/top_03.json per-work stats for the month
/// <root>/report.json      12 MonthSummary records
/// <root>/overrides.json   pending priority overrides
/// ```
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DataStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn month_path(&self, year: i32, month: u32) -> PathBuf {
        self.root
            .join(year.to_string())
            .join(format!("{:02}.json", month))
    }

    pub fn works_path(&self, year: i32, month: u32) -> PathBuf {
        self.root
            .join(year.to_string())
            .join(format!("top_{:02}.json", month))
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.root.join(OVERRIDES_FILE)
    }

    /// Stored days for a month, `None` if the month was never saved.
    pub fn load_month(&self, year: i32, month: u32) -> Result<Option<Vec<DayTask>>, PersistenceError> {
        self.read_json(&self.month_path(year, month))
    }

    pub fn save_month(&self, year: i32, month: u32, days: &[DayTask]) -> Result<(), PersistenceError> {
        self.write_json(&self.month_path(year, month), days)
    }

    pub fn load_report(&self) -> Result<Option<Vec<MonthSummary>>, PersistenceError> {
        self.read_json(&self.report_path())
    }

    /// Read a report document from anywhere on disk.
    pub fn load_report_from(&self, path: &Path) -> Result<Option<Vec<MonthSummary>>, PersistenceError> {
        self.read_json(path)
    }

    pub fn save_report(&self, months: &[MonthSummary]) -> Result<(), PersistenceError> {
        self.write_json(&self.report_path(), months)
    }

    /// Work stats for a month; a month never saved has no works.
    pub fn load_works(&self, year: i32, month: u32) -> Result<MonthWorks, PersistenceError> {
        Ok(self
            .read_json(&self.works_path(year, month))?
            .unwrap_or_default())
    }

    pub fn save_works(&self, year: i32, month: u32, works: &MonthWorks) -> Result<(), PersistenceError> {
        self.write_json(&self.works_path(year, month), works)
    }

    /// The override ledger; a missing file is an empty ledger.
    pub fn load_overrides(&self) -> Result<Vec<OverrideRecord>, PersistenceError> {
        Ok(self.read_json(&self.overrides_path())?.unwrap_or_default())
    }

    pub fn save_overrides(&self, records: &[OverrideRecord]) -> Result<(), PersistenceError> {
        let path = self.overrides_path();
        if records.is_empty() {
            return match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(PersistenceError::Write { path, source: e }),
            };
        }
        self.write_json(&path, records)
    }

    /// Every (year, month) with a stored month document, oldest first.
    pub fn list_months(&self) -> Result<Vec<(i32, u32)>, PersistenceError> {
        let mut months = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(months),
            Err(e) => {
                return Err(PersistenceError::Read {
                    path: self.root.clone(),
                    source: e,
                });
            }
        };

        for entry in entries.flatten() {
            let year_dir = entry.path();
            let Some(year) = year_dir
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<i32>().ok())
            else {
                continue;
            };
            if !year_dir.is_dir() {
                continue;
            }
            let files = fs::read_dir(&year_dir).map_err(|e| PersistenceError::Read {
                path: year_dir.clone(),
                source: e,
            })?;
            for file in files.flatten() {
                let path = file.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                if let Some(month) = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(|s| s.parse::<u32>().ok())
                    .filter(|m| (1..=12).contains(m))
                {
                    months.push((year, month));
                }
            }
        }

        months.sort_unstable();
        Ok(months)
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, PersistenceError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(PersistenceError::Read {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => {
                tracing::debug!(path = %path.display(), "loaded document");
                Ok(Some(value))
            }
            Err(e) => {
                // The file is left as it is; the raw text is also copied to
                // the recovery log.
                recovery::log_recovery(
                    &self.root,
                    RecoveryEntry::new(
                        RecoveryCategory::Parse,
                        &self.relative(path),
                        &e.to_string(),
                        text,
                    ),
                );
                Err(PersistenceError::Parse {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), PersistenceError> {
        let content = serde_json::to_string_pretty(value)?;
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| recovery::atomic_write(path, content.as_bytes()));

        if let Err(e) = result {
            recovery::log_recovery(
                &self.root,
                RecoveryEntry::new(
                    RecoveryCategory::Write,
                    &self.relative(path),
                    &e.to_string(),
                    content,
                ),
            );
            return Err(PersistenceError::Write {
                path: path.to_path_buf(),
                source: e,
            });
        }
        tracing::debug!(path = %path.display(), "saved document");
        Ok(())
    }
}
