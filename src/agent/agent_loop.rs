//! The bounded conversation loop that drives one agent run.
//!
//! Each turn sends the whole conversation plus the tool catalog to the model,
//! executes every tool-use block in order, and answers them with one batched
//! tool-results message. The loop ends when a response carries no tool uses,
//! when the iteration ceiling is hit, or when the model cannot be reached.
//! Whatever happens, the caller gets an [`AgentRunResult`].

use std::collections::BTreeSet;

use tokio::time::Instant;

use super::catalog::catalog;
use super::executor::ToolExecutor;
use super::model::{
    Message, ModelClient, ModelRequest, ModelResponse, ToolCallRequest, ToolResultBlock,
};
use super::system_prompt::{build_system_prompt, build_user_prompt, AgentProfile};
use super::tools::{to_wire, ToolOutput, ToolResult};
use super::RunContext;
use crate::config::AgentConfig;
use crate::error::ModelError;
use crate::exec::truncate_head;
use crate::orchestration::types::AgentRunResult;

const EMPTY_SUMMARY: &str = "No work summary provided";

/// Per-run bookkeeping folded from tool outcomes.
#[derive(Debug, Default)]
struct RunLedger {
    narrative: Vec<String>,
    commits: u32,
    files_changed: BTreeSet<String>,
    handoffs: Vec<String>,
    errors: Vec<String>,
}

impl RunLedger {
    fn track(&mut self, call: &ToolCallRequest, result: &ToolResult) {
        match result {
            Ok(ToolOutput::GitCommit(_)) => self.commits += 1,
            Ok(ToolOutput::WriteFile(out)) => {
                self.files_changed.insert(out.path.clone());
            }
            Ok(ToolOutput::EditFile(out)) => {
                self.files_changed.insert(out.path.clone());
            }
            Ok(ToolOutput::CreateHandoff(out)) => self.handoffs.push(out.handoff_id.clone()),
            Ok(_) => {}
            Err(e) => self.errors.push(format!("{}: {e}", call.name)),
        }
    }
}

/// Run one agent to completion.
///
/// `commit_quota` caps successful `git_commit` calls for this run.
pub async fn run_agent(
    agent_name: &str,
    instructions: Option<&str>,
    ctx: &RunContext,
    model: &dyn ModelClient,
    commit_quota: u32,
) -> AgentRunResult {
    if let Err(e) = model.preflight().await {
        tracing::error!(agent = agent_name, error = %e, "Agent cannot start");
        return AgentRunResult::failed_before_start(agent_name, e.to_string());
    }

    let started = Instant::now();
    let agent_cfg = &ctx.config.agent;

    let profile = AgentProfile::load(&ctx.config.agents_dir(), agent_name).await;
    let system = build_system_prompt(&profile, &ctx.config.safety);
    let mut messages = vec![Message::User(build_user_prompt(instructions))];

    let mut executor = ToolExecutor::new(
        agent_name,
        &ctx.config,
        ctx.safety.clone(),
        ctx.documents.clone(),
        commit_quota,
    );
    let mut ledger = RunLedger::default();

    tracing::info!(
        agent = agent_name,
        model = model.model_name(),
        max_iterations = agent_cfg.max_iterations,
        "Starting agent run"
    );

    for iteration in 1..=agent_cfg.max_iterations {
        let request = ModelRequest {
            system: &system,
            messages: &messages,
            tools: catalog(),
        };
        let response = match call_model(model, &request, agent_cfg, agent_name).await {
            Ok(response) => response,
            Err(fatal) => {
                tracing::error!(agent = agent_name, iteration, error = %fatal, "Ending run");
                ledger.errors.push(fatal);
                break;
            }
        };

        ledger
            .narrative
            .extend(response.texts().map(str::to_string));

        let mut results = Vec::new();
        for call in response.tool_uses() {
            tracing::info!(agent = agent_name, iteration, tool = %call.name, "Executing tool");
            let result = executor.execute(&call.name, &call.input).await;
            ledger.track(call, &result);
            results.push(ToolResultBlock {
                tool_use_id: call.id.clone(),
                content: to_wire(&result).to_string(),
                is_error: result.is_err(),
            });
        }

        let stop_reason = response.stop_reason.clone();
        messages.push(Message::Assistant(response.content));

        if results.is_empty() {
            tracing::info!(agent = agent_name, iteration, ?stop_reason, "Model finished");
            break;
        }
        messages.push(Message::ToolResults(results));

        if iteration == agent_cfg.max_iterations {
            tracing::warn!(agent = agent_name, "Reached iteration limit");
        }
    }

    let narrative = if ledger.narrative.is_empty() {
        EMPTY_SUMMARY.to_string()
    } else {
        ledger.narrative.join("\n")
    };

    let result = AgentRunResult {
        agent_name: agent_name.to_string(),
        success: ledger.errors.is_empty(),
        work_summary: truncate_head(&narrative, agent_cfg.summary_limit),
        commits: ledger.commits,
        files_changed: ledger.files_changed.into_iter().collect(),
        handoffs_created: ledger.handoffs,
        errors: ledger.errors,
        duration_secs: started.elapsed().as_secs_f64(),
        work_log: executor.into_work_log(),
    };

    tracing::info!(
        agent = agent_name,
        success = result.success,
        commits = result.commits,
        errors = result.errors.len(),
        duration_secs = result.duration_secs,
        "Agent run finished"
    );
    result
}

/// One model turn with the retry policy applied.
///
/// Every attempt is preceded by the configured inter-call delay. Rate limits
/// are retried up to `max_retries` attempts in total, waiting either the
/// provider's hint or `rate_limit_backoff * attempt`. Any other failure is
/// returned immediately. The `Err` string is the message recorded on the run.
async fn call_model(
    model: &dyn ModelClient,
    request: &ModelRequest<'_>,
    cfg: &AgentConfig,
    agent_name: &str,
) -> Result<ModelResponse, String> {
    let max_attempts = cfg.max_retries.max(1);

    for attempt in 1..=max_attempts {
        if !cfg.api_call_delay.is_zero() {
            tokio::time::sleep(cfg.api_call_delay).await;
        }

        let outcome = match tokio::time::timeout(cfg.request_timeout, model.complete(request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(ModelError::Timeout(cfg.request_timeout.as_secs())),
        };

        match outcome {
            Ok(response) => return Ok(response),
            Err(ModelError::RateLimited {
                message,
                retry_after,
            }) => {
                if attempt == max_attempts {
                    break;
                }
                let wait = retry_after.unwrap_or(cfg.rate_limit_backoff * attempt);
                tracing::warn!(
                    agent = agent_name,
                    attempt,
                    max_attempts,
                    wait_secs = wait.as_secs(),
                    %message,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(wait).await;
            }
            Err(e) => return Err(format!("API error: {e}")),
        }
    }

    Err(format!("Rate limit exceeded after {max_attempts} retries"))
}
