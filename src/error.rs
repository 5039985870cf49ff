use std::path::PathBuf;
use std::time::Duration;

/// Errors related to configuration loading and parsing.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config at {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid safety pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Tool-level failures. The `Display` form of each variant is exactly the
/// message placed in the `error` field returned to the model.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Access denied to path: {0}")]
    PathDenied(String),

    #[error("Path {0} is outside project directory")]
    OutsideProject(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("File too large: {path} ({size} bytes, limit {max} bytes)")]
    FileTooLarge { path: String, size: u64, max: u64 },

    #[error("String not found in file: {0}...")]
    StringNotFound(String),

    #[error("Command not allowed: {0}")]
    CommandDenied(String),

    #[error("{what} timed out after {secs} seconds")]
    TimedOut { what: &'static str, secs: u64 },

    #[error("Commit limit reached ({0} per day)")]
    CommitQuotaReached(u32),

    #[error("Cannot commit forbidden file: {0}")]
    ForbiddenCommitPath(String),

    #[error("{0}")]
    CommitFailed(String),

    #[error("Git {action} failed: {message}")]
    Git { action: &'static str, message: String },

    #[error("Backlog not found for {0}")]
    BacklogNotFound(String),

    #[error("Task {0} not found in backlog")]
    TaskNotFound(String),

    #[error("Could not find Active Handoffs section")]
    HandoffSectionMissing,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run command: {0}")]
    Exec(#[from] ExecError),

    #[error("Search failed: {0}")]
    Search(String),
}

impl ToolError {
    /// Wrap an I/O error with a short description of the attempted action.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Errors related to child process execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    #[error("Process execution failed: {0}")]
    ProcessFailed(String),
}

/// Errors surfaced by the model provider boundary.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// The provider asked us to slow down. `retry_after` carries the
    /// provider's own wait hint when one was supplied.
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("{0}")]
    Api(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// Configuration problems detected before an agent's first model call.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Missing API key: {0} not set")]
    MissingCredential(String),
}
