pub mod command_filter;
pub mod defaults;
pub mod path_filter;
pub mod workspace;

use std::path::{Path, PathBuf};

use command_filter::CommandFilter;
use path_filter::PathFilter;
use workspace::WorkspaceGuard;

use crate::config::{AppConfig, SafetyConfig};
use crate::error::{ConfigError, ToolError};

/// The two pure predicates every tool call is gated on.
///
/// Built once from [`SafetyConfig`]; evaluation never touches the filesystem
/// or spawns anything, so it can be tested exhaustively.
#[derive(Debug, Clone)]
pub struct SafetyPolicy {
    paths: PathFilter,
    commands: CommandFilter,
}

impl SafetyPolicy {
    pub fn new(config: &SafetyConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            paths: PathFilter::new(&config.forbidden_paths, &config.forbidden_patterns)?,
            commands: CommandFilter::new(&config.allowed_commands, &config.forbidden_commands),
        })
    }

    /// False if the path contains a forbidden substring or matches a
    /// forbidden glob, both compared case-insensitively.
    pub fn path_is_safe(&self, path: &str) -> bool {
        self.paths.is_safe(path)
    }

    /// False if a forbidden substring appears anywhere; otherwise true iff the
    /// first token is allow-listed (by name or as a path's final component).
    pub fn command_is_safe(&self, command: &str) -> bool {
        self.commands.is_safe(command)
    }

    pub fn path_filter(&self) -> &PathFilter {
        &self.paths
    }

    pub fn command_filter(&self) -> &CommandFilter {
        &self.commands
    }
}

/// Combined safety layer: the [`SafetyPolicy`] predicates plus project-root
/// confinement. Tools obtain every filesystem path through
/// [`SafetyLayer::checked_path`] so no I/O happens before both checks pass.
#[derive(Debug)]
pub struct SafetyLayer {
    policy: SafetyPolicy,
    workspace_guard: WorkspaceGuard,
    max_file_read_size: u64,
}

impl SafetyLayer {
    /// Build a SafetyLayer from the resolved application configuration.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let policy = SafetyPolicy::new(&config.safety)
            .map_err(|e| anyhow::anyhow!("Failed to compile safety patterns: {}", e))?;

        let workspace_guard = WorkspaceGuard::new(&config.project_root).map_err(|e| {
            anyhow::anyhow!(
                "Failed to open project root {}: {}",
                config.project_root.display(),
                e
            )
        })?;

        Ok(Self {
            policy,
            workspace_guard,
            max_file_read_size: config.safety.max_file_read_size,
        })
    }

    pub fn path_is_safe(&self, path: &str) -> bool {
        self.policy.path_is_safe(path)
    }

    pub fn command_is_safe(&self, command: &str) -> bool {
        self.policy.command_is_safe(command)
    }

    /// Gate a path on the policy, then confine it to the project root.
    pub fn checked_path(&self, path: &str) -> Result<PathBuf, ToolError> {
        if let Some(rule) = self.policy.path_filter().violation(path) {
            tracing::warn!(path, rule = %rule, "Path denied by safety policy");
            return Err(ToolError::PathDenied(path.to_string()));
        }
        self.confined_path(path)
    }

    /// Confine a path to the project root without consulting the policy.
    pub fn confined_path(&self, path: &str) -> Result<PathBuf, ToolError> {
        self.workspace_guard.resolve(path).ok_or_else(|| {
            tracing::warn!(path, "Path escapes project root");
            ToolError::OutsideProject(path.to_string())
        })
    }

    /// Gate a command line on the policy.
    pub fn check_command(&self, command: &str) -> Result<(), ToolError> {
        if self.policy.command_is_safe(command) {
            return Ok(());
        }
        let reason = self
            .policy
            .command_filter()
            .forbidden_match(command)
            .map(|f| format!("contains `{f}`"))
            .unwrap_or_else(|| "not on the allow-list".to_string());
        tracing::warn!(command, reason = %reason, "Command denied by safety policy");
        Err(ToolError::CommandDenied(command.to_string()))
    }

    pub fn max_file_read_size(&self) -> u64 {
        self.max_file_read_size
    }

    /// Get the canonical project root path.
    pub fn project_root(&self) -> &Path {
        self.workspace_guard.canonical_root()
    }
}
