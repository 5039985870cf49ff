//! Append-only JSONL audit trail of tool invocations.
//!
//! One line per call in `{logs_dir}/pm-tools-{YYYY-MM-DD}.jsonl`, keyed on the
//! local calendar date at the time of the call. Audit failures never fail the
//! tool call; they are reported through `tracing` instead.
//!
//! Uses synchronous `std::fs`: each entry is a single small append.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One audited tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub timestamp: String,
    pub agent: String,
    pub tool: String,
    pub inputs: Value,
    pub success: bool,
}

/// Writer for the per-day audit files under a logs directory.
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the audit file for a given date.
    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("pm-tools-{}.jsonl", date.format("%Y-%m-%d")))
    }

    /// Record a call. Errors are logged and swallowed.
    pub fn record(&self, agent: &str, tool: &str, inputs: &Value, success: bool) {
        let now = Local::now();
        let entry = AuditEntry {
            timestamp: now.to_rfc3339(),
            agent: agent.to_string(),
            tool: tool.to_string(),
            inputs: inputs.clone(),
            success,
        };
        let path = self.path_for(now.date_naive());
        if let Err(e) = append_line(&path, &entry) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write audit entry");
        }
    }
}

fn append_line(path: &Path, entry: &AuditEntry) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}

/// Read back every entry of one audit file, skipping malformed lines.
pub fn read_entries(path: &Path) -> std::io::Result<Vec<AuditEntry>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}
