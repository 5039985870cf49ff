//! Agent-owned markdown documents: per-agent backlogs and the shared handoff
//! board.
//!
//! Tools talk to these through [`WorkDocuments`] so the executor never
//! depends on the documents' exact textual layout.

use std::fs;
use std::path::PathBuf;

use chrono::Local;

use super::tools::{Priority, TaskStatus};
use crate::error::ToolError;

const LAST_UPDATED: &str = "> **Last Updated:**";
const ACTIVE_HANDOFFS: &str = "## Active Handoffs";

/// A handoff to be placed on the shared board.
#[derive(Debug, Clone)]
pub struct HandoffEntry {
    pub id: String,
    pub from: String,
    pub to: String,
    pub priority: Priority,
    pub issue: String,
}

impl HandoffEntry {
    fn render(&self) -> String {
        let title: String = self.issue.chars().take(50).collect();
        let priority = self.priority.as_str();
        let mut chars = priority.chars();
        let priority = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!(
            "\n### [{id}] {title}\n\
             - **From:** {from}\n\
             - **To:** {to}\n\
             - **Priority:** {priority}\n\
             - **Created:** {created}\n\
             \n\
             **Issue:**\n\
             {issue}\n\
             \n\
             **Status:** PENDING\n\
             \n\
             ---\n",
            id = self.id,
            from = self.from,
            to = self.to,
            created = Local::now().format("%Y-%m-%d %H:%M"),
            issue = self.issue,
        )
    }
}

/// Narrow interface over the backlog and handoff documents.
pub trait WorkDocuments: Send + Sync {
    /// Tag the first backlog line mentioning `task_id` with `status`.
    fn mark_task_status(
        &self,
        agent: &str,
        task_id: &str,
        status: TaskStatus,
        notes: Option<&str>,
    ) -> Result<(), ToolError>;

    /// Insert a handoff directly below the active-handoffs heading.
    fn append_handoff(&self, entry: &HandoffEntry) -> Result<(), ToolError>;
}

/// Markdown files on disk: `{agents_dir}/{agent}/BACKLOG.md` and a single
/// handoff board.
#[derive(Debug, Clone)]
pub struct MarkdownDocuments {
    agents_dir: PathBuf,
    handoffs_path: PathBuf,
}

impl MarkdownDocuments {
    pub fn new(agents_dir: impl Into<PathBuf>, handoffs_path: impl Into<PathBuf>) -> Self {
        Self {
            agents_dir: agents_dir.into(),
            handoffs_path: handoffs_path.into(),
        }
    }

    pub fn backlog_path(&self, agent: &str) -> PathBuf {
        self.agents_dir.join(agent).join("BACKLOG.md")
    }
}

impl WorkDocuments for MarkdownDocuments {
    fn mark_task_status(
        &self,
        agent: &str,
        task_id: &str,
        status: TaskStatus,
        notes: Option<&str>,
    ) -> Result<(), ToolError> {
        let path = self.backlog_path(agent);
        if !path.is_file() {
            return Err(ToolError::BacklogNotFound(agent.to_string()));
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| ToolError::io("Failed to update backlog", e))?;

        let updated = mark_status(&content, task_id, status, notes)
            .ok_or_else(|| ToolError::TaskNotFound(task_id.to_string()))?;

        fs::write(&path, updated).map_err(|e| ToolError::io("Failed to update backlog", e))
    }

    fn append_handoff(&self, entry: &HandoffEntry) -> Result<(), ToolError> {
        let content = fs::read_to_string(&self.handoffs_path)
            .map_err(|e| ToolError::io("Failed to create handoff", e))?;

        let updated =
            insert_handoff(&content, &entry.render()).ok_or(ToolError::HandoffSectionMissing)?;

        fs::write(&self.handoffs_path, updated)
            .map_err(|e| ToolError::io("Failed to create handoff", e))
    }
}

/// Returns `None` if no line contains `task_id`.
fn mark_status(
    content: &str,
    task_id: &str,
    status: TaskStatus,
    notes: Option<&str>,
) -> Option<String> {
    let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
    let idx = lines.iter().position(|l| l.contains(task_id))?;

    let tag = format!("[status: {}]", status.as_str());
    let line = &lines[idx];
    lines[idx] = match line.find("[status: ") {
        Some(start) => match line[start..].find(']') {
            Some(len) => format!("{}{}{}", &line[..start], tag, &line[start + len + 1..]),
            None => format!("{} {tag}", line.trim_end()),
        },
        None => format!("{} {tag}", line.trim_end()),
    };

    if let Some(notes) = notes.map(str::trim).filter(|n| !n.is_empty()) {
        lines.insert(idx + 1, format!("  - Note: {notes}"));
    }

    let stamp = format!("{LAST_UPDATED} {}", Local::now().format("%Y-%m-%d %H:%M"));
    if let Some(pos) = lines.iter().position(|l| l.starts_with(LAST_UPDATED)) {
        lines[pos] = stamp;
    }

    let mut out = lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    Some(out)
}

/// Returns `None` if the active-handoffs heading is absent.
fn insert_handoff(content: &str, block: &str) -> Option<String> {
    let start = content.find(ACTIVE_HANDOFFS)?;
    let heading_end = content[start..]
        .find('\n')
        .map(|i| start + i + 1)
        .unwrap_or(content.len());

    let mut out = String::with_capacity(content.len() + block.len() + 1);
    out.push_str(&content[..start]);
    out.push_str(ACTIVE_HANDOFFS);
    out.push('\n');
    out.push_str(block);
    out.push_str(&content[heading_end..]);
    Some(out)
}
