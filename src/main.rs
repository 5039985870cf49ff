use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use pm_agents::agent::genai_client::GenaiClient;
use pm_agents::agent::RunContext;
use pm_agents::cli::Cli;
use pm_agents::config::{self, API_KEY_VAR};
use pm_agents::orchestration::branch::ensure_work_branch;
use pm_agents::orchestration::report;
use pm_agents::orchestration::types::RunSummary;
use pm_agents::orchestration::Orchestrator;

/// Log to stderr and to a daily-rotated file under the logs directory. The
/// returned guard flushes the file writer on drop.
fn init_tracing(logs_dir: &Path) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create logs dir {}", logs_dir.display()))?;
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, "orchestrator.log"));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = config::load_config(&cli)?;
    let agents = cli.resolve_agents(&config.orchestrator);
    let api_key = config::resolve_api_key(&config.project_root);

    if cli.dry_run {
        println!("DRY RUN MODE");
        println!("Model: {}", config.agent.model);
        println!("Would run agents: {}", agents.join(", "));
        println!("API key set: {}", if api_key.is_some() { "Yes" } else { "No" });
        return Ok(ExitCode::SUCCESS);
    }

    let _guard = init_tracing(&config.logs_dir)?;
    tracing::info!(
        model = %config.agent.model,
        project_root = %config.project_root.display(),
        agents = ?agents,
        "PM orchestrator starting"
    );
    if api_key.is_none() {
        tracing::error!("{API_KEY_VAR} not set (environment or .env); agents will not start");
    }

    let model = Arc::new(GenaiClient::new(&config.agent, api_key));
    let ctx = RunContext::new(config)?;

    let branch = ensure_work_branch(ctx.safety.project_root(), &ctx.config.safety.branch_prefix).await;
    tracing::info!(branch = %branch, "Branch ready");

    let started = Instant::now();
    let orchestrator = Orchestrator::new(ctx.clone(), model);
    let results = orchestrator.run_agents(&agents).await;
    let elapsed = started.elapsed().as_secs_f64();

    let daily_report = report::render_daily_report(&results);
    if let Err(e) = report::write_daily_report(&ctx.config, &daily_report) {
        tracing::error!(error = %e, "Failed to save daily report");
    }
    if let Err(e) = report::write_state(&ctx.config.state_path(), &report::render_state(&results)) {
        tracing::error!(error = %e, "Failed to update system state");
    }

    let summary = RunSummary::from_results(&results);
    tracing::info!(
        successful = summary.successful,
        agents = summary.agents_run,
        commits = summary.total_commits,
        duration_secs = elapsed,
        "Orchestration complete"
    );

    Ok(if summary.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
