use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

/// Size past which the oldest entries are dropped (1 MB).
const MAX_LOG_SIZE: u64 = 1_048_576;

/// Written once at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- planner recovery log: content that could not be saved or read normally.
     View with: plan recovery
     Safe to delete once you have rescued what you need. -->

---
";

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// A stored document could not be parsed; body holds the raw text
    Parse,
    /// A document could not be written; body holds the unsaved content
    Write,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Parse => write!(f, "parse"),
            RecoveryCategory::Write => write!(f, "write"),
        }
    }
}

impl RecoveryCategory {
    fn parse_category(s: &str) -> Option<Self> {
        match s {
            "parse" => Some(RecoveryCategory::Parse),
            "write" => Some(RecoveryCategory::Write),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    /// Data-root relative path of the affected document
    pub target: String,
    pub error: String,
    pub body: String,
}

pub fn recovery_log_path(data_root: &Path) -> PathBuf {
    data_root.join(".recovery.log")
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl RecoveryEntry {
    pub fn new(category: RecoveryCategory, target: &str, error: &str, body: String) -> Self {
        RecoveryEntry {
            timestamp: Utc::now(),
            category,
            target: target.to_string(),
            error: error.to_string(),
            body,
        }
    }

    fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {} {}: {}\n\nError: {}\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            self.category,
            self.target,
            self.error,
        );
        if !self.body.is_empty() {
            out.push_str("\n```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        out.push_str("\n---\n");
        out
    }
}

/// Append a recovery entry to the log. Failures are reported, never returned.
///
/// Once the log grows past 1 MB the oldest entries are dropped, so reading
/// the same malformed document over and over cannot grow it without bound.
pub fn log_recovery(data_root: &Path, entry: RecoveryEntry) {
    if let Err(e) = log_recovery_inner(data_root, &entry, MAX_LOG_SIZE) {
        tracing::warn!(
            error = %e,
            document = %entry.target,
            "could not write to recovery log"
        );
    }
}

fn log_recovery_inner(data_root: &Path, entry: &RecoveryEntry, max_size: u64) -> io::Result<()> {
    std::fs::create_dir_all(data_root)?;
    let path = recovery_log_path(data_root);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    {
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        if needs_header {
            file.write_all(FILE_HEADER.as_bytes())?;
        }
        file.write_all(entry.to_markdown().as_bytes())?;
    }

    if std::fs::metadata(&path).is_ok_and(|m| m.len() > max_size) {
        let content = std::fs::read_to_string(&path)?;
        let trimmed = trim_oldest(&content, max_size / 2);
        atomic_write(&path, trimmed.as_bytes())?;
        tracing::debug!(
            before = content.len(),
            after = trimmed.len(),
            "recovery log trimmed"
        );
    }
    Ok(())
}

/// Drop whole entries from the front until the log fits in `target` bytes.
/// The header and the newest entry are always kept.
fn trim_oldest(content: &str, target: u64) -> String {
    let starts = entry_offsets(content);
    let Some((&first, rest)) = starts.split_first() else {
        return content.to_string();
    };
    let header = &content[..first];
    let target = usize::try_from(target).unwrap_or(usize::MAX);
    let keep_from = std::iter::once(first)
        .chain(rest.iter().copied())
        .find(|&start| header.len() + (content.len() - start) <= target)
        .unwrap_or_else(|| starts[starts.len() - 1]);
    format!("{}{}", header, &content[keep_from..])
}

/// Byte offsets of each `## ` entry header, skipping code block bodies.
fn entry_offsets(content: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    let mut pos = 0;
    let mut in_code_block = false;
    for line in content.split_inclusive('\n') {
        let text = line.trim_end_matches('\n');
        if in_code_block {
            if text == "```" {
                in_code_block = false;
            }
        } else if text.starts_with("```") {
            in_code_block = true;
        } else if text.starts_with("## ") {
            offsets.push(pos);
        }
        pos += line.len();
    }
    offsets
}

/// Read recovery entries, most recent first.
pub fn read_recovery_entries(data_root: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let Ok(content) = std::fs::read_to_string(recovery_log_path(data_root)) else {
        return Vec::new();
    };
    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    entries.reverse();
    entries
}

fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some((timestamp, category, target)) =
            line.strip_prefix("## ").and_then(parse_entry_header)
        else {
            continue;
        };

        let mut error = String::new();
        let mut body = String::new();
        let mut in_code_block = false;
        for line in lines.by_ref() {
            if in_code_block {
                if line == "```" {
                    in_code_block = false;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }
            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                in_code_block = true;
            } else if let Some(e) = line.strip_prefix("Error: ") {
                error = e.to_string();
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            target,
            error,
            body,
        });
    }
    entries
}

/// `<timestamp> <category>: <target>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp, rest) = header.split_once(' ')?;
    let (category, target) = rest.split_once(": ")?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .ok()?
        .with_timezone(&Utc);
    Some((
        timestamp,
        RecoveryCategory::parse_category(category)?,
        target.to_string(),
    ))
}
