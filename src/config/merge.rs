use super::schema::{
    AgentConfig, AgentSection, AppConfig, OrchestratorConfig, OrchestratorSection, PartialConfig,
    SafetyConfig, SafetySection,
};
use crate::safety::defaults;
use std::path::PathBuf;
use std::time::Duration;

impl PartialConfig {
    /// Merge self with a lower-priority fallback.
    /// Self's non-None values take precedence.
    /// For list fields: REPLACE semantics (if self has Some, use it entirely).
    pub fn with_fallback(self, fallback: PartialConfig) -> PartialConfig {
        PartialConfig {
            project_root: self.project_root.or(fallback.project_root),
            docs_dir: self.docs_dir.or(fallback.docs_dir),
            logs_dir: self.logs_dir.or(fallback.logs_dir),
            safety: self.safety.with_fallback(fallback.safety),
            agent: self.agent.with_fallback(fallback.agent),
            orchestrator: self.orchestrator.with_fallback(fallback.orchestrator),
        }
    }

    /// Convert to AppConfig, filling any remaining gaps with defaults.
    /// Relative docs/logs directories are anchored at the project root.
    pub fn finalize(self) -> AppConfig {
        let project_root = self.project_root.unwrap_or_else(|| PathBuf::from("."));
        let docs_dir = project_root.join(
            self.docs_dir
                .unwrap_or_else(|| PathBuf::from("docs/pm-agents")),
        );
        let logs_dir = project_root.join(self.logs_dir.unwrap_or_else(|| PathBuf::from("logs")));

        AppConfig {
            project_root,
            docs_dir,
            logs_dir,
            safety: self.safety.finalize(),
            agent: self.agent.finalize(),
            orchestrator: self.orchestrator.finalize(),
        }
    }
}

impl SafetySection {
    fn with_fallback(self, fallback: SafetySection) -> SafetySection {
        SafetySection {
            forbidden_paths: self.forbidden_paths.or(fallback.forbidden_paths),
            forbidden_patterns: self.forbidden_patterns.or(fallback.forbidden_patterns),
            max_file_read_size: self.max_file_read_size.or(fallback.max_file_read_size),
            max_commits_per_agent: self.max_commits_per_agent.or(fallback.max_commits_per_agent),
            max_commits_per_day: self.max_commits_per_day.or(fallback.max_commits_per_day),
            branch_prefix: self.branch_prefix.or(fallback.branch_prefix),
            allowed_commands: self.allowed_commands.or(fallback.allowed_commands),
            forbidden_commands: self.forbidden_commands.or(fallback.forbidden_commands),
        }
    }

    fn finalize(self) -> SafetyConfig {
        SafetyConfig {
            forbidden_paths: self
                .forbidden_paths
                .unwrap_or_else(defaults::default_forbidden_paths),
            forbidden_patterns: self
                .forbidden_patterns
                .unwrap_or_else(defaults::default_forbidden_patterns),
            max_file_read_size: self.max_file_read_size.unwrap_or(5 * 1024 * 1024),
            max_commits_per_agent: self.max_commits_per_agent.unwrap_or(10),
            max_commits_per_day: self.max_commits_per_day.unwrap_or(50),
            branch_prefix: self.branch_prefix.unwrap_or_else(|| "pm-agents".to_string()),
            allowed_commands: self
                .allowed_commands
                .unwrap_or_else(defaults::default_allowed_commands),
            forbidden_commands: self
                .forbidden_commands
                .unwrap_or_else(defaults::default_forbidden_commands),
        }
    }
}

impl AgentSection {
    fn with_fallback(self, fallback: AgentSection) -> AgentSection {
        AgentSection {
            model: self.model.or(fallback.model),
            max_tokens: self.max_tokens.or(fallback.max_tokens),
            temperature: self.temperature.or(fallback.temperature),
            max_iterations: self.max_iterations.or(fallback.max_iterations),
            max_retries: self.max_retries.or(fallback.max_retries),
            rate_limit_backoff_secs: self
                .rate_limit_backoff_secs
                .or(fallback.rate_limit_backoff_secs),
            api_call_delay_secs: self.api_call_delay_secs.or(fallback.api_call_delay_secs),
            request_timeout_secs: self.request_timeout_secs.or(fallback.request_timeout_secs),
            summary_limit: self.summary_limit.or(fallback.summary_limit),
        }
    }

    fn finalize(self) -> AgentConfig {
        AgentConfig {
            model: self
                .model
                .unwrap_or_else(|| "claude-3-haiku-20240307".to_string()),
            max_tokens: self.max_tokens.unwrap_or(2048),
            temperature: self.temperature.unwrap_or(0.7),
            max_iterations: self.max_iterations.unwrap_or(5),
            max_retries: self.max_retries.unwrap_or(3),
            rate_limit_backoff: Duration::from_secs(self.rate_limit_backoff_secs.unwrap_or(60)),
            api_call_delay: Duration::from_secs(self.api_call_delay_secs.unwrap_or(2)),
            request_timeout: Duration::from_secs(self.request_timeout_secs.unwrap_or(300)),
            summary_limit: self.summary_limit.unwrap_or(2000),
        }
    }
}

impl OrchestratorSection {
    fn with_fallback(self, fallback: OrchestratorSection) -> OrchestratorSection {
        OrchestratorSection {
            active_agents: self.active_agents.or(fallback.active_agents),
            quick_agents: self.quick_agents.or(fallback.quick_agents),
            test_agent_count: self.test_agent_count.or(fallback.test_agent_count),
            inter_agent_delay_secs: self
                .inter_agent_delay_secs
                .or(fallback.inter_agent_delay_secs),
            report_to_desktop: self.report_to_desktop.or(fallback.report_to_desktop),
        }
    }

    fn finalize(self) -> OrchestratorConfig {
        OrchestratorConfig {
            active_agents: self.active_agents.unwrap_or_else(default_active_agents),
            quick_agents: self.quick_agents.unwrap_or_else(default_quick_agents),
            test_agent_count: self.test_agent_count.unwrap_or(2),
            inter_agent_delay: Duration::from_secs(self.inter_agent_delay_secs.unwrap_or(30)),
            report_to_desktop: self.report_to_desktop.unwrap_or(true),
        }
    }
}

fn default_active_agents() -> Vec<String> {
    [
        "PM-Intelligence",
        "PM-Context",
        "PM-Transactions",
        "PM-Experience",
        "PM-Growth",
        "PM-Integration",
        "PM-Discovery",
        "PM-Communication",
        "PM-Infrastructure",
        "PM-Security",
        "PM-Research",
        "PM-QA",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_quick_agents() -> Vec<String> {
    [
        "PM-Intelligence",
        "PM-Experience",
        "PM-Context",
        "PM-Research",
        "PM-QA",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
