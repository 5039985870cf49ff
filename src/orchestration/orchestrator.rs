//! Sequential driver over a list of agents.
//!
//! Agents share one git working tree and one provider rate limit, so they run
//! strictly one after another with a fixed pause in between. A failed agent
//! never stops the ones after it.

use std::sync::Arc;

use super::types::AgentRunResult;
use crate::agent::model::ModelClient;
use crate::agent::{run_agent, RunContext};

pub struct Orchestrator {
    ctx: RunContext,
    model: Arc<dyn ModelClient>,
}

impl Orchestrator {
    pub fn new(ctx: RunContext, model: Arc<dyn ModelClient>) -> Self {
        Self { ctx, model }
    }

    /// Run every agent in order and collect one result per agent.
    pub async fn run_agents(&self, agent_names: &[String]) -> Vec<AgentRunResult> {
        let safety = &self.ctx.config.safety;
        let delay = self.ctx.config.orchestrator.inter_agent_delay;
        let mut results = Vec::with_capacity(agent_names.len());
        let mut commits_so_far: u32 = 0;

        for (i, name) in agent_names.iter().enumerate() {
            tracing::info!(agent = %name, position = i + 1, total = agent_names.len(), "Running agent");

            let remaining_today = safety.max_commits_per_day.saturating_sub(commits_so_far);
            let quota = safety.max_commits_per_agent.min(remaining_today);

            let result = run_agent(name, None, &self.ctx, self.model.as_ref(), quota).await;
            commits_so_far += result.commits;

            if result.success {
                tracing::info!(
                    agent = %name,
                    commits = result.commits,
                    files = result.files_changed.len(),
                    duration_secs = result.duration_secs,
                    "Agent completed"
                );
            } else {
                tracing::warn!(agent = %name, errors = ?result.errors, "Agent failed");
            }
            results.push(result);

            if i + 1 < agent_names.len() && !delay.is_zero() {
                tracing::info!(delay_secs = delay.as_secs(), "Waiting before next agent");
                tokio::time::sleep(delay).await;
            }
        }

        results
    }
}
