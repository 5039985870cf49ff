use clap::Parser;
use std::path::PathBuf;

use crate::config::OrchestratorConfig;

#[derive(Parser, Debug, Default)]
#[command(
    name = "pm-agents",
    version,
    about = "Run autonomous PM agents against a project"
)]
pub struct Cli {
    /// Comma-separated list of specific agents to run
    #[arg(long, value_delimiter = ',')]
    pub agents: Option<Vec<String>>,

    /// Quick run (configured quick agent list)
    #[arg(long)]
    pub quick: bool,

    /// Test mode (first few active agents only)
    #[arg(long)]
    pub test: bool,

    /// Show what would run without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Project root directory
    #[arg(long)]
    pub project_root: Option<PathBuf>,

    /// Path to config file (overrides `<project_root>/pm-agents.toml`)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum conversation turns per agent
    #[arg(long)]
    pub max_iterations: Option<u32>,
}

impl Cli {
    /// Agents to run: explicit list, then the quick list, then the first
    /// `test_agent_count` active agents in test mode, else every active agent.
    pub fn resolve_agents(&self, config: &OrchestratorConfig) -> Vec<String> {
        if let Some(agents) = &self.agents {
            let explicit: Vec<String> = agents
                .iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect();
            if !explicit.is_empty() {
                return explicit;
            }
        }
        if self.quick {
            return config.quick_agents.clone();
        }
        if self.test {
            return config
                .active_agents
                .iter()
                .take(config.test_agent_count)
                .cloned()
                .collect();
        }
        config.active_agents.clone()
    }
}
