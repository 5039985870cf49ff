//! Agent profile loading and prompt construction.
//!
//! Each agent owns a directory `{agents_dir}/{name}/` holding `AGENT.md`
//! (identity and ownership), `VISION.md` and `BACKLOG.md`. Missing files are
//! not an error: the prompt falls back to generic text so a freshly-added
//! agent can still run.

use std::path::Path;

use chrono::Local;

use super::catalog::tool_descriptions;
use crate::config::SafetyConfig;

const IDENTITY_SECTIONS: &[&str] = &["## 1. Identity", "## 2. Capability", "## 14. File"];
const IDENTITY_LINE_LIMIT: usize = 50;
const READY_LINE_LIMIT: usize = 30;

pub const DEFAULT_INSTRUCTIONS: &str = "Execute your highest priority task.";

/// The markdown documents describing one agent.
#[derive(Debug, Clone, Default)]
pub struct AgentProfile {
    pub name: String,
    pub definition: Option<String>,
    pub vision: Option<String>,
    pub backlog: Option<String>,
}

impl AgentProfile {
    pub async fn load(agents_dir: &Path, name: &str) -> Self {
        let dir = agents_dir.join(name);
        let read = |file: &'static str| {
            let path = dir.join(file);
            async move { tokio::fs::read_to_string(&path).await.ok() }
        };

        let profile = Self {
            name: name.to_string(),
            definition: read("AGENT.md").await,
            vision: read("VISION.md").await,
            backlog: read("BACKLOG.md").await,
        };
        if profile.definition.is_none() {
            tracing::warn!(agent = name, dir = %dir.display(), "No AGENT.md found, using generic identity");
        }
        profile
    }

    /// The identity, capability and file-ownership sections of `AGENT.md`.
    pub fn identity_summary(&self) -> String {
        let Some(definition) = &self.definition else {
            return "You are a PM agent.".to_string();
        };

        let mut kept = Vec::new();
        let mut in_section = false;
        let mut sections_seen = 0;
        for line in definition.lines() {
            if IDENTITY_SECTIONS.iter().any(|s| line.starts_with(s)) {
                in_section = true;
                sections_seen += 1;
            } else if line.starts_with("## ") && in_section {
                in_section = false;
                if sections_seen >= IDENTITY_SECTIONS.len() {
                    break;
                }
            }
            if in_section {
                kept.push(line);
            }
        }
        kept.truncate(IDENTITY_LINE_LIMIT);
        kept.join("\n")
    }

    /// Non-blank lines of the backlog's "Ready" section.
    pub fn ready_tasks(&self) -> String {
        let Some(backlog) = &self.backlog else {
            return "No tasks in backlog.".to_string();
        };

        let mut kept = Vec::new();
        let mut in_ready = false;
        for line in backlog.lines() {
            let is_ready_heading =
                line.contains("## Ready") || (line.contains("### ") && line.contains("Ready"));
            if is_ready_heading {
                in_ready = true;
                continue;
            }
            if in_ready && line.starts_with("## ") {
                break;
            }
            if in_ready && !line.trim().is_empty() {
                kept.push(line);
            }
        }
        kept.truncate(READY_LINE_LIMIT);
        kept.join("\n")
    }
}

/// System instruction: identity, today's ready tasks, the tool catalog, and
/// the standing rules.
pub fn build_system_prompt(profile: &AgentProfile, safety: &SafetyConfig) -> String {
    let identity = profile.identity_summary();
    let tasks = profile.ready_tasks();
    let tools = tool_descriptions();
    let never_modify = safety
        .forbidden_paths
        .iter()
        .map(|p| p.trim_end_matches('/'))
        .collect::<Vec<_>>()
        .join(", ");
    let today = Local::now().format("%Y-%m-%d %H:%M");
    let name = &profile.name;

    format!(
        "\
You are {name}, an autonomous PM agent working on this project.

{identity}

## Today's Tasks (pick ONE)

{tasks}

## Available Tools

{tools}

## Rules

1. Pick ONE task from your backlog
2. Read relevant files first
3. Make small changes
4. Run lint after edits
5. Commit with clear message
6. Log what you did

Never modify: {never_modify}

Today: {today}

Start by picking a task and reading the relevant files.
"
    )
}

/// First user message of a run.
pub fn build_user_prompt(instructions: Option<&str>) -> String {
    let instructions = instructions
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_INSTRUCTIONS);

    format!(
        "\
Instructions: {instructions}

Your task:
1. Pick ONE task from the backlog shown above
2. Read the relevant files (use read_file tool)
3. Make the changes (use edit_file or write_file)
4. Run lint (use run_lint tool)
5. Commit (use git_commit tool)
6. Log your work (use log_work tool)

Begin now - start by reading a file related to your chosen task.
"
    )
}
