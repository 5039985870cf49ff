//! Typed tool arguments and results.
//!
//! Raw model-supplied JSON is parsed into a [`ToolInput`] before any handler
//! runs, so each handler works on a plain struct. Handlers return a
//! [`ToolResult`]: either a typed [`ToolOutput`] payload or a [`ToolError`].
//! [`to_wire`] produces the JSON object the model sees, with the `error` key
//! present exactly when the call failed.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::catalog::ToolName;
use crate::error::ToolError;

pub type ToolResult = Result<ToolOutput, ToolError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadFileArgs {
    pub path: String,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditFileArgs {
    pub path: String,
    pub old_string: String,
    pub new_string: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunCommandArgs {
    pub command: String,
    pub working_directory: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub pattern: String,
    pub file_pattern: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDirectoryArgs {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitCommitArgs {
    pub message: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitDiffArgs {
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunTestsArgs {
    pub test_pattern: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunLintArgs {
    #[serde(default)]
    pub fix: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBacklogArgs {
    pub task_id: String,
    pub status: TaskStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHandoffArgs {
    pub to_pm: String,
    pub issue: String,
    pub priority: Priority,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogWorkArgs {
    pub summary: String,
    pub details: Option<String>,
    #[serde(default)]
    pub files_changed: Vec<String>,
}

/// A tool call with its arguments validated against the tool's shape.
#[derive(Debug, Clone)]
pub enum ToolInput {
    ReadFile(ReadFileArgs),
    WriteFile(WriteFileArgs),
    EditFile(EditFileArgs),
    RunCommand(RunCommandArgs),
    SearchCodebase(SearchArgs),
    ListDirectory(ListDirectoryArgs),
    GitStatus,
    GitCommit(GitCommitArgs),
    GitDiff(GitDiffArgs),
    RunTests(RunTestsArgs),
    RunLint(RunLintArgs),
    UpdateBacklog(UpdateBacklogArgs),
    CreateHandoff(CreateHandoffArgs),
    LogWork(LogWorkArgs),
}

impl ToolInput {
    /// Resolve `name` against the catalog, then decode `args` into that
    /// tool's argument struct. A missing/null argument object counts as `{}`.
    pub fn parse(name: &str, args: &Value) -> Result<Self, ToolError> {
        let tool: ToolName = name.parse()?;
        let args = if args.is_null() { json!({}) } else { args.clone() };

        Ok(match tool {
            ToolName::ReadFile => ToolInput::ReadFile(decode(tool, args)?),
            ToolName::WriteFile => ToolInput::WriteFile(decode(tool, args)?),
            ToolName::EditFile => ToolInput::EditFile(decode(tool, args)?),
            ToolName::RunCommand => ToolInput::RunCommand(decode(tool, args)?),
            ToolName::SearchCodebase => ToolInput::SearchCodebase(decode(tool, args)?),
            ToolName::ListDirectory => ToolInput::ListDirectory(decode(tool, args)?),
            ToolName::GitStatus => ToolInput::GitStatus,
            ToolName::GitCommit => ToolInput::GitCommit(decode(tool, args)?),
            ToolName::GitDiff => ToolInput::GitDiff(decode(tool, args)?),
            ToolName::RunTests => ToolInput::RunTests(decode(tool, args)?),
            ToolName::RunLint => ToolInput::RunLint(decode(tool, args)?),
            ToolName::UpdateBacklog => ToolInput::UpdateBacklog(decode(tool, args)?),
            ToolName::CreateHandoff => ToolInput::CreateHandoff(decode(tool, args)?),
            ToolName::LogWork => ToolInput::LogWork(decode(tool, args)?),
        })
    }
}

fn decode<T: DeserializeOwned>(tool: ToolName, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadFileOutput {
    pub content: String,
    pub lines: usize,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteFileOutput {
    pub path: String,
    pub bytes_written: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditFileOutput {
    pub path: String,
    pub occurrences_found: usize,
    pub replaced: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatch {
    pub file: String,
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutput {
    pub matches: Vec<SearchMatch>,
    pub count: usize,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDirectoryOutput {
    pub path: String,
    pub items: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitStatusOutput {
    pub changed_files: Vec<String>,
    pub count: usize,
    pub clean: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitCommitOutput {
    pub message: String,
    pub output: String,
    /// Commits made by this agent in the current run, including this one.
    pub commits_today: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitDiffOutput {
    pub diff: String,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckRunOutput {
    pub stdout: String,
    pub exit_code: Option<i32>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBacklogOutput {
    pub task_id: String,
    pub new_status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHandoffOutput {
    pub handoff_id: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogWorkOutput {
    pub logged: String,
}

/// Success payload of a tool call. Serialized without a tag, so the model
/// sees only the tool's own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    ReadFile(ReadFileOutput),
    WriteFile(WriteFileOutput),
    EditFile(EditFileOutput),
    RunCommand(RunCommandOutput),
    Search(SearchOutput),
    ListDirectory(ListDirectoryOutput),
    GitStatus(GitStatusOutput),
    GitCommit(GitCommitOutput),
    GitDiff(GitDiffOutput),
    CheckRun(CheckRunOutput),
    UpdateBacklog(UpdateBacklogOutput),
    CreateHandoff(CreateHandoffOutput),
    LogWork(LogWorkOutput),
}

/// JSON object returned to the model for a tool call.
pub fn to_wire(result: &ToolResult) -> Value {
    match result {
        Ok(output) => serde_json::to_value(output)
            .unwrap_or_else(|e| json!({"error": format!("Failed to serialize result: {e}")})),
        Err(e) => json!({"error": e.to_string()}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_applies_defaults() {
        let input = ToolInput::parse("search_codebase", &json!({"pattern": "foo"})).unwrap();
        match input {
            ToolInput::SearchCodebase(args) => {
                assert_eq!(args.pattern, "foo");
                assert_eq!(args.max_results, 20);
                assert!(args.file_pattern.is_none());
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn null_arguments_are_an_empty_object() {
        let input = ToolInput::parse("git_status", &Value::Null).unwrap();
        assert!(matches!(input, ToolInput::GitStatus));

        let lint = ToolInput::parse("run_lint", &Value::Null).unwrap();
        assert!(matches!(lint, ToolInput::RunLint(RunLintArgs { fix: false })));
    }

    #[test]
    fn unknown_tool_is_reported_before_arguments() {
        let err = ToolInput::parse("format_disk", &json!("garbage")).unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(ref n) if n == "format_disk"));
    }

    #[test]
    fn missing_required_argument_is_invalid() {
        let err = ToolInput::parse("write_file", &json!({"path": "a.txt"})).unwrap_err();
        match err {
            ToolError::InvalidArguments { tool, message } => {
                assert_eq!(tool, "write_file");
                assert!(message.contains("content"), "message: {message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn enum_arguments_reject_values_outside_the_set() {
        let err = ToolInput::parse(
            "update_backlog",
            &json!({"task_id": "T-1", "status": "done"}),
        )
        .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let ok = ToolInput::parse(
            "update_backlog",
            &json!({"task_id": "T-1", "status": "in_progress"}),
        )
        .unwrap();
        match ok {
            ToolInput::UpdateBacklog(args) => assert_eq!(args.status, TaskStatus::InProgress),
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn wire_form_has_exclusive_error_key() {
        let ok: ToolResult = Ok(ToolOutput::LogWork(LogWorkOutput {
            logged: "Fixed flaky test".into(),
        }));
        let wire = to_wire(&ok);
        assert_eq!(wire, json!({"logged": "Fixed flaky test"}));
        assert!(wire.get("error").is_none());

        let err: ToolResult = Err(ToolError::NotFound("src/missing.ts".into()));
        let wire = to_wire(&err);
        assert_eq!(wire, json!({"error": "File not found: src/missing.ts"}));
        assert_eq!(wire.as_object().map(|o| o.len()), Some(1));
    }

    #[test]
    fn edit_output_serializes_counts() {
        let out = ToolOutput::EditFile(EditFileOutput {
            path: "a.ts".into(),
            occurrences_found: 3,
            replaced: 1,
        });
        let wire = to_wire(&Ok(out));
        assert_eq!(wire["occurrences_found"], 3);
        assert_eq!(wire["replaced"], 1);
    }
}
