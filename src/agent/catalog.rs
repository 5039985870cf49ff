//! The fixed tool catalog exposed to the model.
//!
//! Each tool is a [`ToolName`] variant with a declarative [`ToolSpec`]: a
//! description and a typed parameter list from which the JSON schema sent to
//! the provider and the human-readable summary in the system prompt are both
//! generated.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::error::ToolError;

/// Closed set of tool names. Unknown names never reach a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ReadFile,
    WriteFile,
    EditFile,
    RunCommand,
    SearchCodebase,
    ListDirectory,
    GitStatus,
    GitCommit,
    GitDiff,
    RunTests,
    RunLint,
    UpdateBacklog,
    CreateHandoff,
    LogWork,
}

impl ToolName {
    pub const ALL: [ToolName; 14] = [
        ToolName::ReadFile,
        ToolName::WriteFile,
        ToolName::EditFile,
        ToolName::RunCommand,
        ToolName::SearchCodebase,
        ToolName::ListDirectory,
        ToolName::GitStatus,
        ToolName::GitCommit,
        ToolName::GitDiff,
        ToolName::RunTests,
        ToolName::RunLint,
        ToolName::UpdateBacklog,
        ToolName::CreateHandoff,
        ToolName::LogWork,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::ReadFile => "read_file",
            ToolName::WriteFile => "write_file",
            ToolName::EditFile => "edit_file",
            ToolName::RunCommand => "run_command",
            ToolName::SearchCodebase => "search_codebase",
            ToolName::ListDirectory => "list_directory",
            ToolName::GitStatus => "git_status",
            ToolName::GitCommit => "git_commit",
            ToolName::GitDiff => "git_diff",
            ToolName::RunTests => "run_tests",
            ToolName::RunLint => "run_lint",
            ToolName::UpdateBacklog => "update_backlog",
            ToolName::CreateHandoff => "create_handoff",
            ToolName::LogWork => "log_work",
        }
    }

    pub fn spec(self) -> &'static ToolSpec {
        // CATALOG is declared in ALL order.
        &CATALOG[self as usize]
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    StringArray,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamDefault {
    Integer(i64),
    Boolean(bool),
}

#[derive(Debug)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
    /// Empty when any value of `ty` is accepted.
    pub allowed: &'static [&'static str],
    pub default: Option<ParamDefault>,
}

#[derive(Debug)]
pub struct ToolSpec {
    pub name: ToolName,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
}

const fn param(
    name: &'static str,
    ty: ParamType,
    required: bool,
    description: &'static str,
) -> ParamSpec {
    ParamSpec {
        name,
        ty,
        required,
        description,
        allowed: &[],
        default: None,
    }
}

pub const TASK_STATUSES: &[&str] = &["pending", "in_progress", "completed", "blocked"];
pub const HANDOFF_PRIORITIES: &[&str] = &["low", "medium", "high", "critical"];

pub static CATALOG: [ToolSpec; 14] = [
    ToolSpec {
        name: ToolName::ReadFile,
        description: "Read the contents of a file. Use this to understand existing code before making changes.",
        params: &[
            param("path", ParamType::String, true, "Path to the file relative to project root"),
            param("start_line", ParamType::Integer, false, "Optional: Start reading from this line (1-indexed)"),
            param("end_line", ParamType::Integer, false, "Optional: Stop reading at this line (inclusive)"),
        ],
    },
    ToolSpec {
        name: ToolName::WriteFile,
        description: "Write content to a file. Creates the file if it doesn't exist. Use for creating new files.",
        params: &[
            param("path", ParamType::String, true, "Path to the file relative to project root"),
            param("content", ParamType::String, true, "The full content to write to the file"),
        ],
    },
    ToolSpec {
        name: ToolName::EditFile,
        description: "Edit a file by replacing the first occurrence of a string with another. Use for precise code modifications.",
        params: &[
            param("path", ParamType::String, true, "Path to the file relative to project root"),
            param("old_string", ParamType::String, true, "The exact string to find and replace"),
            param("new_string", ParamType::String, true, "The string to replace it with"),
        ],
    },
    ToolSpec {
        name: ToolName::RunCommand,
        description: "Run a shell command. Use for npm commands, tests, linting, etc.",
        params: &[
            param("command", ParamType::String, true, "The command to run"),
            param("working_directory", ParamType::String, false, "Optional: Directory to run the command in (relative to project root)"),
        ],
    },
    ToolSpec {
        name: ToolName::SearchCodebase,
        description: "Search file contents in the codebase with a regex pattern.",
        params: &[
            param("pattern", ParamType::String, true, "The search pattern (regex supported)"),
            param("file_pattern", ParamType::String, false, "Optional: File glob pattern to search in (e.g., '*.tsx')"),
            ParamSpec {
                default: Some(ParamDefault::Integer(20)),
                ..param("max_results", ParamType::Integer, false, "Maximum number of results to return")
            },
        ],
    },
    ToolSpec {
        name: ToolName::ListDirectory,
        description: "List files and directories in a path.",
        params: &[
            param("path", ParamType::String, true, "Path to the directory relative to project root"),
            ParamSpec {
                default: Some(ParamDefault::Boolean(false)),
                ..param("recursive", ParamType::Boolean, false, "Whether to list files recursively")
            },
        ],
    },
    ToolSpec {
        name: ToolName::GitStatus,
        description: "Get the current git status showing modified, staged, and untracked files.",
        params: &[],
    },
    ToolSpec {
        name: ToolName::GitCommit,
        description: "Stage and commit changes to git with a descriptive message.",
        params: &[
            param("message", ParamType::String, true, "The commit message describing the changes"),
            param("files", ParamType::StringArray, false, "Optional: Specific files to commit. If empty, commits all changes."),
        ],
    },
    ToolSpec {
        name: ToolName::GitDiff,
        description: "Show the diff of current uncommitted changes.",
        params: &[param("file", ParamType::String, false, "Optional: Show diff for a specific file")],
    },
    ToolSpec {
        name: ToolName::RunTests,
        description: "Run the test suite to verify changes work correctly.",
        params: &[param("test_pattern", ParamType::String, false, "Optional: Pattern to filter which tests to run")],
    },
    ToolSpec {
        name: ToolName::RunLint,
        description: "Run the linter to check code quality.",
        params: &[ParamSpec {
            default: Some(ParamDefault::Boolean(false)),
            ..param("fix", ParamType::Boolean, false, "Whether to auto-fix linting issues")
        }],
    },
    ToolSpec {
        name: ToolName::UpdateBacklog,
        description: "Update your PM backlog with task status changes.",
        params: &[
            param("task_id", ParamType::String, true, "The task ID to update"),
            ParamSpec {
                allowed: TASK_STATUSES,
                ..param("status", ParamType::String, true, "New status for the task")
            },
            param("notes", ParamType::String, false, "Optional notes about the task"),
        ],
    },
    ToolSpec {
        name: ToolName::CreateHandoff,
        description: "Create a handoff to another PM agent for cross-domain issues.",
        params: &[
            param("to_pm", ParamType::String, true, "The PM to hand off to (e.g., 'PM-Context')"),
            param("issue", ParamType::String, true, "Description of the issue"),
            ParamSpec {
                allowed: HANDOFF_PRIORITIES,
                ..param("priority", ParamType::String, true, "Priority of the handoff")
            },
        ],
    },
    ToolSpec {
        name: ToolName::LogWork,
        description: "Log work done for the daily report.",
        params: &[
            param("summary", ParamType::String, true, "Brief summary of work done"),
            param("details", ParamType::String, false, "Detailed description of changes made"),
            param("files_changed", ParamType::StringArray, false, "List of files that were modified"),
        ],
    },
];

/// The full catalog, in declaration order.
pub fn catalog() -> &'static [ToolSpec] {
    &CATALOG
}

impl ToolSpec {
    /// JSON schema object for the provider's tool declaration.
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        for p in self.params {
            let mut prop = match p.ty {
                ParamType::String => json!({"type": "string"}),
                ParamType::Integer => json!({"type": "integer"}),
                ParamType::Boolean => json!({"type": "boolean"}),
                ParamType::StringArray => json!({"type": "array", "items": {"type": "string"}}),
            };
            prop["description"] = json!(p.description);
            if !p.allowed.is_empty() {
                prop["enum"] = json!(p.allowed);
            }
            match p.default {
                Some(ParamDefault::Integer(n)) => prop["default"] = json!(n),
                Some(ParamDefault::Boolean(b)) => prop["default"] = json!(b),
                None => {}
            }
            properties.insert(p.name.to_string(), prop);
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Human-readable summary of every tool for the system prompt.
pub fn tool_descriptions() -> String {
    let mut out = String::new();
    for spec in catalog() {
        out.push_str(&format!("### {}\n{}\n", spec.name, spec.description));
        for p in spec.params {
            let ty = match p.ty {
                ParamType::String => "string",
                ParamType::Integer => "integer",
                ParamType::Boolean => "boolean",
                ParamType::StringArray => "string[]",
            };
            let need = if p.required { "required" } else { "optional" };
            out.push_str(&format!("- **{}** ({ty}, {need}): {}", p.name, p.description));
            if !p.allowed.is_empty() {
                out.push_str(&format!(" [one of: {}]", p.allowed.join(", ")));
            }
            out.push('\n');
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_in_enum_order() {
        for (i, name) in ToolName::ALL.into_iter().enumerate() {
            assert_eq!(CATALOG[i].name, name);
            assert_eq!(name.spec().name, name);
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for name in ToolName::ALL {
            assert_eq!(name.as_str().parse::<ToolName>().unwrap(), name);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "rm_everything".parse::<ToolName>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: rm_everything");
    }

    #[test]
    fn schema_lists_required_params_and_enums() {
        let schema = ToolName::UpdateBacklog.spec().input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["required"], json!(["task_id", "status"]));
        assert_eq!(
            schema["properties"]["status"]["enum"],
            json!(["pending", "in_progress", "completed", "blocked"])
        );
    }

    #[test]
    fn schema_carries_defaults_and_array_items() {
        let search = ToolName::SearchCodebase.spec().input_schema();
        assert_eq!(search["properties"]["max_results"]["default"], 20);

        let commit = ToolName::GitCommit.spec().input_schema();
        assert_eq!(commit["properties"]["files"]["items"]["type"], "string");
    }

    #[test]
    fn parameterless_tool_has_empty_schema() {
        let schema = ToolName::GitStatus.spec().input_schema();
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }

    #[test]
    fn descriptions_cover_every_tool() {
        let desc = tool_descriptions();
        for name in ToolName::ALL {
            assert!(desc.contains(&format!("### {name}")), "missing {name}");
        }
        assert!(desc.contains("[one of: low, medium, high, critical]"));
    }
}
