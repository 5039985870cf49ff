//! Tool dispatch for a single agent run.
//!
//! [`ToolExecutor::execute`] is the only entry point: it parses the raw call
//! into a [`ToolInput`], routes it to a handler, and records exactly one
//! audit entry whatever the outcome. Handlers gate every path and command
//! through the [`SafetyLayer`] before touching the disk or spawning anything,
//! and convert every internal failure into a [`ToolError`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use regex::Regex;
use serde_json::Value;

use super::audit::AuditLog;
use super::documents::{HandoffEntry, WorkDocuments};
use super::tools::*;
use crate::config::AppConfig;
use crate::error::ToolError;
use crate::exec::{self, ExecResult};
use crate::orchestration::types::WorkLogEntry;
use crate::safety::SafetyLayer;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const GIT_TIMEOUT: Duration = Duration::from_secs(60);
const TEST_TIMEOUT: Duration = Duration::from_secs(120);
const LINT_TIMEOUT: Duration = Duration::from_secs(60);

const STDOUT_LIMIT: usize = 5000;
const STDERR_LIMIT: usize = 2000;
const DIFF_LIMIT: usize = 10_000;
const TEST_OUTPUT_LIMIT: usize = 5000;
const LINT_OUTPUT_LIMIT: usize = 3000;
const FLAT_LIST_LIMIT: usize = 50;
const RECURSIVE_LIST_LIMIT: usize = 100;
const SEARCH_LINE_LIMIT: usize = 300;

const SEARCH_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "py", "md"];
const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Executes tool calls on behalf of one agent.
pub struct ToolExecutor {
    agent_name: String,
    safety: Arc<SafetyLayer>,
    documents: Arc<dyn WorkDocuments>,
    audit: AuditLog,
    commit_quota: u32,
    commits_made: u32,
    work_log: Vec<WorkLogEntry>,
}

impl ToolExecutor {
    /// `commit_quota` is the number of commits this run may still make.
    pub fn new(
        agent_name: &str,
        config: &AppConfig,
        safety: Arc<SafetyLayer>,
        documents: Arc<dyn WorkDocuments>,
        commit_quota: u32,
    ) -> Self {
        Self {
            agent_name: agent_name.to_string(),
            audit: AuditLog::new(&config.logs_dir),
            safety,
            documents,
            commit_quota,
            commits_made: 0,
            work_log: Vec::new(),
        }
    }

    pub fn commits_made(&self) -> u32 {
        self.commits_made
    }

    pub fn work_log(&self) -> &[WorkLogEntry] {
        &self.work_log
    }

    pub fn into_work_log(self) -> Vec<WorkLogEntry> {
        self.work_log
    }

    /// Run one tool call. Never panics and never returns anything but a
    /// [`ToolResult`]; every call is audited.
    pub async fn execute(&mut self, name: &str, args: &Value) -> ToolResult {
        let result = match ToolInput::parse(name, args) {
            Ok(input) => self.dispatch(input).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            tracing::warn!(agent = %self.agent_name, tool = name, error = %e, "Tool call failed");
        } else {
            tracing::debug!(agent = %self.agent_name, tool = name, "Tool call succeeded");
        }
        self.audit.record(&self.agent_name, name, args, result.is_ok());

        result
    }

    async fn dispatch(&mut self, input: ToolInput) -> ToolResult {
        match input {
            ToolInput::ReadFile(args) => self.read_file(args).await,
            ToolInput::WriteFile(args) => self.write_file(args).await,
            ToolInput::EditFile(args) => self.edit_file(args).await,
            ToolInput::RunCommand(args) => self.run_command(args).await,
            ToolInput::SearchCodebase(args) => self.search_codebase(args).await,
            ToolInput::ListDirectory(args) => self.list_directory(args).await,
            ToolInput::GitStatus => self.git_status().await,
            ToolInput::GitCommit(args) => self.git_commit(args).await,
            ToolInput::GitDiff(args) => self.git_diff(args).await,
            ToolInput::RunTests(args) => self.run_tests(args).await,
            ToolInput::RunLint(args) => self.run_lint(args).await,
            ToolInput::UpdateBacklog(args) => self.update_backlog(args),
            ToolInput::CreateHandoff(args) => self.create_handoff(args),
            ToolInput::LogWork(args) => Ok(self.log_work(args)),
        }
    }

    fn root(&self) -> &Path {
        self.safety.project_root()
    }

    async fn read_file(&self, args: ReadFileArgs) -> ToolResult {
        let full = self.safety.checked_path(&args.path)?;

        let meta = match tokio::fs::metadata(&full).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::NotFound(args.path));
            }
            Err(e) => return Err(ToolError::io("Failed to read file", e)),
        };
        let max = self.safety.max_file_read_size();
        if meta.len() > max {
            return Err(ToolError::FileTooLarge {
                path: args.path,
                size: meta.len(),
                max,
            });
        }

        let bytes = tokio::fs::read(&full)
            .await
            .map_err(|e| ToolError::io("Failed to read file", e))?;
        let text = String::from_utf8_lossy(&bytes);

        let content = if args.start_line.is_some() || args.end_line.is_some() {
            let lines: Vec<&str> = text.split_inclusive('\n').collect();
            let start = args.start_line.unwrap_or(1).saturating_sub(1);
            let end = args.end_line.unwrap_or(lines.len()).min(lines.len());
            if start < end {
                lines[start..end].concat()
            } else {
                String::new()
            }
        } else {
            text.into_owned()
        };

        Ok(ToolOutput::ReadFile(ReadFileOutput {
            lines: content.lines().count(),
            content,
            path: args.path,
        }))
    }

    async fn write_file(&self, args: WriteFileArgs) -> ToolResult {
        let full = self.safety.checked_path(&args.path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::io("Failed to write file", e))?;
        }
        tokio::fs::write(&full, args.content.as_bytes())
            .await
            .map_err(|e| ToolError::io("Failed to write file", e))?;

        Ok(ToolOutput::WriteFile(WriteFileOutput {
            path: args.path,
            bytes_written: args.content.len(),
        }))
    }

    /// Replaces the first occurrence only, reporting how many were present.
    async fn edit_file(&self, args: EditFileArgs) -> ToolResult {
        if args.old_string.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: "edit_file".into(),
                message: "old_string must not be empty".into(),
            });
        }
        let full = self.safety.checked_path(&args.path)?;

        let content = match tokio::fs::read_to_string(&full).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::NotFound(args.path));
            }
            Err(e) => return Err(ToolError::io("Failed to edit file", e)),
        };

        let occurrences = content.matches(args.old_string.as_str()).count();
        if occurrences == 0 {
            return Err(ToolError::StringNotFound(
                exec::truncate_head(&args.old_string, 50),
            ));
        }

        let updated = content.replacen(args.old_string.as_str(), &args.new_string, 1);
        tokio::fs::write(&full, updated)
            .await
            .map_err(|e| ToolError::io("Failed to edit file", e))?;

        Ok(ToolOutput::EditFile(EditFileOutput {
            path: args.path,
            occurrences_found: occurrences,
            replaced: 1,
        }))
    }

    async fn run_command(&self, args: RunCommandArgs) -> ToolResult {
        self.safety.check_command(&args.command)?;

        let cwd = match args.working_directory.as_deref() {
            Some(dir) if !dir.trim().is_empty() => self.safety.confined_path(dir)?,
            _ => self.root().to_path_buf(),
        };

        let result = exec::execute_shell(&args.command, &cwd, COMMAND_TIMEOUT).await?;
        if result.timed_out {
            return Err(timed_out("Command", COMMAND_TIMEOUT));
        }

        Ok(ToolOutput::RunCommand(RunCommandOutput {
            success: result.success(),
            stdout: exec::truncate_head(&result.stdout, STDOUT_LIMIT),
            stderr: exec::truncate_head(&result.stderr, STDERR_LIMIT),
            exit_code: result.exit_code,
        }))
    }

    async fn search_codebase(&self, args: SearchArgs) -> ToolResult {
        let regex =
            Regex::new(&args.pattern).map_err(|e| ToolError::Search(e.to_string()))?;
        let file_pattern = args
            .file_pattern
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(glob::Pattern::new)
            .transpose()
            .map_err(|e| ToolError::InvalidArguments {
                tool: "search_codebase".into(),
                message: format!("invalid file_pattern: {e}"),
            })?;

        let safety = Arc::clone(&self.safety);
        let max_results = args.max_results;
        tokio::task::spawn_blocking(move || {
            search_tree(&safety, &regex, file_pattern.as_ref(), max_results)
        })
        .await
        .map_err(|e| ToolError::Search(e.to_string()))?
    }

    async fn list_directory(&self, args: ListDirectoryArgs) -> ToolResult {
        let full = self.safety.checked_path(&args.path)?;

        let meta = match tokio::fs::metadata(&full).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ToolError::DirectoryNotFound(args.path));
            }
            Err(e) => return Err(ToolError::io("Failed to list directory", e)),
        };
        if !meta.is_dir() {
            return Err(ToolError::NotADirectory(args.path));
        }

        let recursive = args.recursive;
        let items = tokio::task::spawn_blocking(move || {
            if recursive {
                list_files_recursive(&full, RECURSIVE_LIST_LIMIT)
            } else {
                list_entries(&full, FLAT_LIST_LIMIT)
            }
        })
        .await
        .map_err(|e| ToolError::io("Failed to list directory", std::io::Error::other(e)))?
        .map_err(|e| ToolError::io("Failed to list directory", e))?;

        Ok(ToolOutput::ListDirectory(ListDirectoryOutput {
            path: args.path,
            count: items.len(),
            items,
        }))
    }

    async fn git_status(&self) -> ToolResult {
        let result = self.git("status", &["status", "--porcelain"]).await?;
        let changed_files: Vec<String> = result
            .stdout
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();

        Ok(ToolOutput::GitStatus(GitStatusOutput {
            count: changed_files.len(),
            clean: changed_files.is_empty(),
            changed_files,
        }))
    }

    async fn git_commit(&mut self, args: GitCommitArgs) -> ToolResult {
        if self.commits_made >= self.commit_quota {
            return Err(ToolError::CommitQuotaReached(self.commit_quota));
        }

        for file in &args.files {
            if !self.safety.path_is_safe(file) {
                return Err(ToolError::ForbiddenCommitPath(file.clone()));
            }
            self.safety.confined_path(file)?;
        }

        if args.files.is_empty() {
            self.git("add", &["add", "-A"]).await?;
        } else {
            let mut add = vec!["add", "--"];
            add.extend(args.files.iter().map(String::as_str));
            self.git("add", &add).await?;
        }

        let message = format!("[{}] {}", self.agent_name, args.message);
        let result = exec::run_program(
            "git",
            &["commit", "-m", message.as_str()],
            self.root(),
            GIT_TIMEOUT,
        )
        .await?;
        if result.timed_out {
            return Err(timed_out("Git commit", GIT_TIMEOUT));
        }
        if !result.success() {
            let reason = [result.stderr.trim(), result.stdout.trim()]
                .into_iter()
                .find(|s| !s.is_empty())
                .unwrap_or("Nothing to commit");
            return Err(ToolError::CommitFailed(reason.to_string()));
        }

        self.commits_made += 1;
        tracing::info!(agent = %self.agent_name, commits = self.commits_made, "Committed changes");

        Ok(ToolOutput::GitCommit(GitCommitOutput {
            message,
            output: result.stdout.trim().to_string(),
            commits_today: self.commits_made,
        }))
    }

    async fn git_diff(&self, args: GitDiffArgs) -> ToolResult {
        let file = args.file.filter(|f| !f.trim().is_empty());
        if let Some(file) = &file {
            self.safety.checked_path(file)?;
        }

        let mut cmd = vec!["diff"];
        if let Some(file) = &file {
            cmd.push("--");
            cmd.push(file);
        }
        let result = self.git("diff", &cmd).await?;

        Ok(ToolOutput::GitDiff(GitDiffOutput {
            truncated: result.stdout.chars().count() > DIFF_LIMIT,
            diff: exec::truncate_head(&result.stdout, DIFF_LIMIT),
        }))
    }

    async fn run_tests(&self, args: RunTestsArgs) -> ToolResult {
        let command = match args.test_pattern.as_deref().filter(|p| !p.trim().is_empty()) {
            Some(pattern) => format!("npx vitest run -t {}", shell_quote(pattern)),
            None => "npm run test".to_string(),
        };
        self.check_run(&command, "Tests", TEST_TIMEOUT, TEST_OUTPUT_LIMIT)
            .await
    }

    async fn run_lint(&self, args: RunLintArgs) -> ToolResult {
        let command = if args.fix {
            "npm run lint:fix"
        } else {
            "npm run lint"
        };
        self.check_run(command, "Lint", LINT_TIMEOUT, LINT_OUTPUT_LIMIT)
            .await
    }

    /// Shared body of the test and lint entry points: keeps the tail of
    /// stdout, where runners print their summaries.
    async fn check_run(
        &self,
        command: &str,
        what: &'static str,
        timeout: Duration,
        limit: usize,
    ) -> ToolResult {
        self.safety.check_command(command)?;
        let result = exec::execute_shell(command, self.root(), timeout).await?;
        if result.timed_out {
            return Err(timed_out(what, timeout));
        }

        Ok(ToolOutput::CheckRun(CheckRunOutput {
            stdout: exec::truncate_tail(&result.stdout, limit),
            exit_code: result.exit_code,
            passed: result.success(),
        }))
    }

    fn update_backlog(&self, args: UpdateBacklogArgs) -> ToolResult {
        if args.task_id.trim().is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: "update_backlog".into(),
                message: "task_id must not be empty".into(),
            });
        }
        self.documents.mark_task_status(
            &self.agent_name,
            &args.task_id,
            args.status,
            args.notes.as_deref(),
        )?;

        Ok(ToolOutput::UpdateBacklog(UpdateBacklogOutput {
            task_id: args.task_id,
            new_status: args.status,
        }))
    }

    fn create_handoff(&self, args: CreateHandoffArgs) -> ToolResult {
        let entry = HandoffEntry {
            id: new_handoff_id(),
            from: self.agent_name.clone(),
            to: args.to_pm,
            priority: args.priority,
            issue: args.issue,
        };
        self.documents.append_handoff(&entry)?;
        tracing::info!(agent = %self.agent_name, id = %entry.id, to = %entry.to, "Created handoff");

        Ok(ToolOutput::CreateHandoff(CreateHandoffOutput {
            handoff_id: entry.id,
            to: entry.to,
        }))
    }

    fn log_work(&mut self, args: LogWorkArgs) -> ToolOutput {
        self.work_log.push(WorkLogEntry {
            timestamp: Local::now().to_rfc3339(),
            summary: args.summary.clone(),
            details: args.details,
            files_changed: args.files_changed,
        });
        ToolOutput::LogWork(LogWorkOutput {
            logged: args.summary,
        })
    }

    /// Run a git subcommand in the project root, failing on non-zero exit.
    async fn git(&self, action: &'static str, args: &[&str]) -> Result<ExecResult, ToolError> {
        let result = exec::run_program("git", args, self.root(), GIT_TIMEOUT).await?;
        if result.timed_out {
            return Err(timed_out("Git", GIT_TIMEOUT));
        }
        if !result.success() {
            return Err(ToolError::Git {
                action,
                message: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }
}

fn timed_out(what: &'static str, timeout: Duration) -> ToolError {
    ToolError::TimedOut {
        what,
        secs: timeout.as_secs(),
    }
}

/// `HO-` plus six upper-case hex digits.
fn new_handoff_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("HO-{}", hex[..6].to_uppercase())
}

/// Single-quote for `sh -c`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn list_entries(dir: &Path, limit: usize) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names.truncate(limit);
    Ok(names)
}

fn list_files_recursive(dir: &Path, limit: usize) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    walk(dir, dir, &mut |rel, _| {
        files.push(rel.to_string_lossy().into_owned());
        files.len() < limit
    })?;
    Ok(files)
}

/// Depth-first walk over regular files in name order, skipping VCS and
/// dependency directories. `visit` receives (relative, absolute) paths and
/// returns false to stop.
fn walk(
    root: &Path,
    dir: &Path,
    visit: &mut dyn FnMut(&Path, &Path) -> bool,
) -> std::io::Result<bool> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        let Ok(file_type) = std::fs::symlink_metadata(&path).map(|m| m.file_type()) else {
            continue;
        };
        let rel = path.strip_prefix(root).unwrap_or(&path);
        if file_type.is_dir() {
            let skipped = path
                .file_name()
                .is_some_and(|n| SKIPPED_DIRS.iter().any(|s| n == *s));
            if skipped {
                continue;
            }
            if !walk(root, &path, visit)? {
                return Ok(false);
            }
        } else if file_type.is_file() && !visit(rel, &path) {
            return Ok(false);
        }
    }
    Ok(true)
}

fn search_tree(
    safety: &SafetyLayer,
    regex: &Regex,
    file_pattern: Option<&glob::Pattern>,
    max_results: usize,
) -> ToolResult {
    let root = safety.project_root().to_path_buf();
    let max_size = safety.max_file_read_size();
    let deadline = Instant::now() + SEARCH_TIMEOUT;
    let mut matches = Vec::new();
    let mut truncated = false;
    let mut expired = false;

    let wanted = |rel: &Path| -> bool {
        match file_pattern {
            Some(pattern) => rel
                .file_name()
                .is_some_and(|n| pattern.matches(&n.to_string_lossy())),
            None => rel
                .extension()
                .is_some_and(|ext| SEARCH_EXTENSIONS.iter().any(|e| ext == *e)),
        }
    };

    walk(&root, &root, &mut |rel, abs| {
        if Instant::now() > deadline {
            expired = true;
            return false;
        }
        let rel_str = rel.to_string_lossy();
        if !wanted(rel) || !safety.path_is_safe(&rel_str) {
            return true;
        }
        let oversized = std::fs::metadata(abs).map_or(true, |m| m.len() > max_size);
        if oversized {
            return true;
        }
        let Ok(text) = std::fs::read_to_string(abs) else {
            return true;
        };
        for (idx, line) in text.lines().enumerate() {
            if Instant::now() > deadline {
                expired = true;
                return false;
            }
            if !regex.is_match(line) {
                continue;
            }
            if matches.len() == max_results {
                truncated = true;
                return false;
            }
            matches.push(SearchMatch {
                file: rel_str.to_string(),
                line: idx + 1,
                text: exec::truncate_head(line.trim(), SEARCH_LINE_LIMIT),
            });
        }
        true
    })
    .map_err(|e| ToolError::Search(e.to_string()))?;

    if expired {
        return Err(timed_out("Search", SEARCH_TIMEOUT));
    }

    Ok(ToolOutput::Search(SearchOutput {
        count: matches.len(),
        matches,
        truncated,
    }))
}
