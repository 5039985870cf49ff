use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// The TOML file structure for pm-agents.toml.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub general: Option<GeneralConfig>,
    pub safety: Option<SafetySection>,
    pub agent: Option<AgentSection>,
    pub orchestrator: Option<OrchestratorSection>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GeneralConfig {
    pub project_root: Option<String>,
    pub docs_dir: Option<String>,
    pub logs_dir: Option<String>,
}

/// `[safety]` section. List fields, when present, fully replace the defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SafetySection {
    pub forbidden_paths: Option<Vec<String>>,
    pub forbidden_patterns: Option<Vec<String>>,
    pub max_file_read_size: Option<u64>,
    pub max_commits_per_agent: Option<u32>,
    pub max_commits_per_day: Option<u32>,
    pub branch_prefix: Option<String>,
    pub allowed_commands: Option<Vec<String>>,
    pub forbidden_commands: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentSection {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub max_iterations: Option<u32>,
    pub max_retries: Option<u32>,
    pub rate_limit_backoff_secs: Option<u64>,
    pub api_call_delay_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub summary_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrchestratorSection {
    pub active_agents: Option<Vec<String>>,
    pub quick_agents: Option<Vec<String>>,
    pub test_agent_count: Option<usize>,
    pub inter_agent_delay_secs: Option<u64>,
    pub report_to_desktop: Option<bool>,
}

/// Guardrails applied to every tool call. Read-only once constructed.
#[derive(Debug, Clone)]
pub struct SafetyConfig {
    /// Substrings that make a path off-limits (case-insensitive).
    pub forbidden_paths: Vec<String>,
    /// Filename globs that make a path off-limits (case-insensitive).
    pub forbidden_patterns: Vec<String>,
    pub max_file_read_size: u64,
    pub max_commits_per_agent: u32,
    pub max_commits_per_day: u32,
    pub branch_prefix: String,
    /// Command names an agent may invoke as the first token.
    pub allowed_commands: Vec<String>,
    /// Substrings that reject a command line outright (case-insensitive).
    pub forbidden_commands: Vec<String>,
}

/// Model and conversation-loop settings for a single agent run.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub max_iterations: u32,
    pub max_retries: u32,
    /// Base unit of the rate-limit backoff; attempt N waits `N * base`.
    pub rate_limit_backoff: Duration,
    /// Applied before every model call attempt.
    pub api_call_delay: Duration,
    pub request_timeout: Duration,
    /// Maximum characters kept from the model's narrative.
    pub summary_limit: usize,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub active_agents: Vec<String>,
    pub quick_agents: Vec<String>,
    pub test_agent_count: usize,
    pub inter_agent_delay: Duration,
    pub report_to_desktop: bool,
}

/// Fully-resolved runtime configuration. All fields have values.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub project_root: PathBuf,
    pub docs_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub safety: SafetyConfig,
    pub agent: AgentConfig,
    pub orchestrator: OrchestratorConfig,
}

impl AppConfig {
    /// Directory holding one sub-directory of documents per agent.
    pub fn agents_dir(&self) -> PathBuf {
        self.docs_dir.join("agents")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.docs_dir.join("reports")
    }

    pub fn handoffs_path(&self) -> PathBuf {
        self.docs_dir.join("HANDOFFS.md")
    }

    pub fn state_path(&self) -> PathBuf {
        self.docs_dir.join("STATE.md")
    }
}

/// Partial config used during merge. All fields are Option so that
/// missing fields don't override lower-priority values.
#[derive(Debug, Clone, Default)]
pub struct PartialConfig {
    pub project_root: Option<PathBuf>,
    pub docs_dir: Option<PathBuf>,
    pub logs_dir: Option<PathBuf>,
    pub safety: SafetySection,
    pub agent: AgentSection,
    pub orchestrator: OrchestratorSection,
}

impl ConfigFile {
    pub fn to_partial(self) -> PartialConfig {
        let general = self.general.unwrap_or_default();
        PartialConfig {
            project_root: general.project_root.map(PathBuf::from),
            docs_dir: general.docs_dir.map(PathBuf::from),
            logs_dir: general.logs_dir.map(PathBuf::from),
            safety: self.safety.unwrap_or_default(),
            agent: self.agent.unwrap_or_default(),
            orchestrator: self.orchestrator.unwrap_or_default(),
        }
    }
}
