//! Markdown daily report and system-state snapshot.
//!
//! Both are plain templated strings over a slice of [`AgentRunResult`]; the
//! `write_*` helpers only decide where they land on disk.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Local;

use super::types::{AgentRunResult, RunSummary};
use crate::config::AppConfig;

const REPORT_SUMMARY_LIMIT: usize = 1000;
const REPORT_FILES_LIMIT: usize = 10;
const REPORT_ERRORS_LIMIT: usize = 5;

/// Overall health of a run, derived from how many agents succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Degraded,
    Failed,
}

impl Health {
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.successful == summary.agents_run {
            Health::Healthy
        } else if summary.successful > 0 {
            Health::Degraded
        } else {
            Health::Failed
        }
    }

    fn label(self) -> &'static str {
        match self {
            Health::Healthy => "🟢 Healthy",
            Health::Degraded => "🟡 Degraded",
            Health::Failed => "🔴 Failed",
        }
    }
}

fn status_mark(success: bool) -> &'static str {
    if success { "✅" } else { "❌" }
}

pub fn render_daily_report(results: &[AgentRunResult]) -> String {
    let now = Local::now();
    let summary = RunSummary::from_results(results);
    let mut out = String::new();

    let _ = write!(
        out,
        "# PM Daily Report - {date}\n\n\
         > Generated: {generated}\n\n\
         ## Executive Summary\n\n\
         | Metric | Value |\n\
         |--------|-------|\n\
         | Agents Run | {run} |\n\
         | Successful | {ok} |\n\
         | Total Commits | {commits} |\n\
         | Files Changed | {files} |\n\
         | Handoffs Created | {handoffs} |\n\n\
         ## Agent Reports\n\n",
        date = now.format("%Y-%m-%d"),
        generated = now.format("%Y-%m-%d %H:%M:%S"),
        run = summary.agents_run,
        ok = summary.successful,
        commits = summary.total_commits,
        files = summary.total_files_changed,
        handoffs = summary.total_handoffs,
    );

    for r in results {
        let status = if r.success { "✅ Success" } else { "❌ Failed" };
        let work: String = r.work_summary.chars().take(REPORT_SUMMARY_LIMIT).collect();
        let _ = write!(
            out,
            "### {name}\n\n\
             **Status:** {status}\n\
             **Duration:** {duration:.1}s\n\
             **Commits:** {commits}\n\n\
             #### Work Summary\n\n\
             {work}\n\n",
            name = r.agent_name,
            duration = r.duration_secs,
            commits = r.commits,
        );

        if !r.files_changed.is_empty() {
            out.push_str("#### Files Changed\n");
            for f in r.files_changed.iter().take(REPORT_FILES_LIMIT) {
                let _ = writeln!(out, "- `{f}`");
            }
            out.push('\n');
        }

        if !r.errors.is_empty() {
            out.push_str("#### Errors\n");
            for e in r.errors.iter().take(REPORT_ERRORS_LIMIT) {
                let _ = writeln!(out, "- {e}");
            }
            out.push('\n');
        }

        out.push_str("---\n\n");
    }

    out.push_str(
        "## Next Steps\n\n\
         1. Review completed work and verify quality\n\
         2. Assign follow-up tasks as needed\n\
         3. Address any handoffs or blockers\n\
         4. Continue with backlog priorities\n\n\
         ---\n\
         *This report was generated autonomously by the PM agent system.*\n",
    );
    out
}

pub fn render_state(results: &[AgentRunResult]) -> String {
    let now = Local::now();
    let summary = RunSummary::from_results(results);
    let health = Health::from_summary(&summary);
    let mut out = String::new();

    let _ = write!(
        out,
        "# PM System State\n\n\
         > **Last Updated:** {updated}\n\
         > **Last Run:** {last_run}\n\n\
         ## System Status\n\n\
         | Indicator | Status |\n\
         |-----------|--------|\n\
         | **Overall Health** | {health} |\n\
         | **Agents Active** | {run} |\n\
         | **Agents Successful** | {ok} |\n\
         | **Total Commits Today** | {commits} |\n\
         | **Files Changed Today** | {files} |\n\n\
         ## Agent Status\n\n\
         | Agent | Status | Commits | Files | Duration |\n\
         |-------|--------|---------|-------|----------|\n",
        updated = now.format("%Y-%m-%d %H:%M:%S"),
        last_run = now.format("%Y-%m-%d %H:%M"),
        health = health.label(),
        run = summary.agents_run,
        ok = summary.successful,
        commits = summary.total_commits,
        files = summary.total_files_changed,
    );

    for r in results {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {:.1}s |",
            r.agent_name,
            status_mark(r.success),
            r.commits,
            r.files_changed.len(),
            r.duration_secs
        );
    }

    out.push_str(
        "\n## Current Priorities\n\n\
         1. Review and merge today's commits\n\
         2. Address any failed agent runs\n\
         3. Follow up on created handoffs\n\n\
         ## Notes\n\n\
         This state is automatically updated after each orchestrator run.\n",
    );
    out
}

/// Write the report under `{reports_dir}/{date}/daily-report.md`, plus a
/// desktop copy when enabled and a desktop directory exists. Returns the
/// project-local path.
pub fn write_daily_report(config: &AppConfig, report: &str) -> anyhow::Result<PathBuf> {
    let date = Local::now().format("%Y-%m-%d").to_string();
    let dir = config.reports_dir().join(&date);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create report dir {}", dir.display()))?;

    let path = dir.join("daily-report.md");
    fs::write(&path, report)
        .with_context(|| format!("Failed to write report {}", path.display()))?;
    tracing::info!(path = %path.display(), "Report saved");

    if config.orchestrator.report_to_desktop {
        match desktop_dir() {
            Some(desktop) => {
                let copy = desktop.join(format!("PM-Report-{date}.md"));
                match fs::write(&copy, report) {
                    Ok(()) => tracing::info!(path = %copy.display(), "Report copied to desktop"),
                    Err(e) => tracing::warn!(path = %copy.display(), error = %e, "Desktop copy failed"),
                }
            }
            None => tracing::debug!("No desktop directory, skipping report copy"),
        }
    }

    Ok(path)
}

pub fn write_state(path: &Path, state: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, state).with_context(|| format!("Failed to write state {}", path.display()))
}

fn desktop_dir() -> Option<PathBuf> {
    directories::UserDirs::new().and_then(|dirs| dirs.desktop_dir().map(Path::to_path_buf))
}
