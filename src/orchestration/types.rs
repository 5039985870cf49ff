//! Result types shared between the agent loop, the orchestrator and the
//! report writers.
//!
//! All types derive [`serde::Serialize`] and [`serde::Deserialize`] so a run
//! can be dumped as JSON alongside the markdown report.

use serde::{Deserialize, Serialize};

/// A self-reported accomplishment recorded by the `log_work` tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkLogEntry {
    /// RFC 3339 local timestamp.
    pub timestamp: String,
    pub summary: String,
    pub details: Option<String>,
    pub files_changed: Vec<String>,
}

/// Outcome of one agent's conversation loop.
///
/// Produced exactly once per agent run, including runs that fail before the
/// first model call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentRunResult {
    pub agent_name: String,
    /// True iff `errors` is empty.
    pub success: bool,
    /// Model narration joined by newlines, truncated to the configured limit.
    pub work_summary: String,
    pub commits: u32,
    /// Deduplicated, sorted.
    pub files_changed: Vec<String>,
    pub handoffs_created: Vec<String>,
    pub errors: Vec<String>,
    pub duration_secs: f64,
    pub work_log: Vec<WorkLogEntry>,
}

impl AgentRunResult {
    /// A run that never reached the model.
    pub fn failed_before_start(agent_name: &str, error: String) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            success: false,
            work_summary: error.clone(),
            commits: 0,
            files_changed: Vec::new(),
            handoffs_created: Vec::new(),
            errors: vec![error],
            duration_secs: 0.0,
            work_log: Vec::new(),
        }
    }
}

/// Aggregate counts over a whole orchestrated run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub agents_run: usize,
    pub successful: usize,
    pub total_commits: u32,
    pub total_files_changed: usize,
    pub total_handoffs: usize,
}

impl RunSummary {
    pub fn from_results(results: &[AgentRunResult]) -> Self {
        Self {
            agents_run: results.len(),
            successful: results.iter().filter(|r| r.success).count(),
            total_commits: results.iter().map(|r| r.commits).sum(),
            total_files_changed: results.iter().map(|r| r.files_changed.len()).sum(),
            total_handoffs: results.iter().map(|r| r.handoffs_created.len()).sum(),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.successful == self.agents_run
    }
}
