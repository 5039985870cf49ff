#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tempfile::TempDir;
use tokio::time::Instant;

use pm_agents::agent::executor::ToolExecutor;
use pm_agents::agent::model::{
    ContentBlock, Message, ModelClient, ModelRequest, ModelResponse, StopReason, ToolCallRequest,
};
use pm_agents::agent::RunContext;
use pm_agents::config::{AppConfig, PartialConfig};
use pm_agents::error::{AgentError, ModelError};

pub const AGENT: &str = "PM-Test";

// ─── Project fixture ──────────────────────────────────────────────────

/// A throwaway project directory with logs kept outside of it, so audit
/// files never show up in listings or git status.
pub struct TestProject {
    _tmp: TempDir,
    pub root: PathBuf,
    pub logs: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().expect("failed to create temp dir");
        let root = tmp.path().join("project");
        let logs = tmp.path().join("logs");
        std::fs::create_dir_all(&root).unwrap();
        Self {
            _tmp: tmp,
            root,
            logs,
        }
    }

    /// Defaults with every wait zeroed out.
    pub fn config(&self) -> AppConfig {
        let mut config = PartialConfig {
            project_root: Some(self.root.clone()),
            logs_dir: Some(self.logs.clone()),
            ..Default::default()
        }
        .finalize();
        config.agent.api_call_delay = Duration::ZERO;
        config.agent.rate_limit_backoff = Duration::from_secs(10);
        config.orchestrator.inter_agent_delay = Duration::ZERO;
        config
    }

    pub fn context(&self, config: AppConfig) -> RunContext {
        RunContext::new(config).expect("failed to build run context")
    }

    pub fn executor(&self, config: &AppConfig, commit_quota: u32) -> ToolExecutor {
        let ctx = self.context(config.clone());
        ToolExecutor::new(AGENT, &ctx.config, ctx.safety, ctx.documents, commit_quota)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root.join(rel)).unwrap()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

/// Run git in `dir`, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let out = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        out.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&out.stderr)
    );
    String::from_utf8_lossy(&out.stdout).into_owned()
}

pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// `git init` with a local identity so commits work on bare CI machines.
pub fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["config", "user.email", "pm@example.com"]);
    git(dir, &["config", "user.name", "PM Test"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

// ─── Scripted model ───────────────────────────────────────────────────

pub fn text(s: &str) -> ContentBlock {
    ContentBlock::Text(s.to_string())
}

pub fn tool_use(id: &str, name: &str, input: Value) -> ContentBlock {
    ContentBlock::ToolUse(ToolCallRequest {
        id: id.to_string(),
        name: name.to_string(),
        input,
    })
}

pub fn reply(content: Vec<ContentBlock>) -> Result<ModelResponse, ModelError> {
    let stop_reason = if content.iter().any(|b| matches!(b, ContentBlock::ToolUse(_))) {
        StopReason::ToolUse
    } else {
        StopReason::EndTurn
    };
    Ok(ModelResponse {
        content,
        stop_reason,
    })
}

pub fn rate_limited(retry_after: Option<Duration>) -> Result<ModelResponse, ModelError> {
    Err(ModelError::RateLimited {
        message: "429 Too Many Requests".into(),
        retry_after,
    })
}

/// What the model saw on one call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub at: Instant,
    pub messages: Vec<Message>,
}

/// A [`ModelClient`] that replays canned responses in order. Once the script
/// runs out it answers with a plain "Done." so runs always terminate.
#[derive(Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    calls: Mutex<Vec<RecordedCall>>,
    preflight_error: Option<String>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<ModelResponse, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    pub fn without_credentials() -> Arc<Self> {
        Arc::new(Self {
            preflight_error: Some("ANTHROPIC_API_KEY".into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn preflight(&self) -> Result<(), AgentError> {
        match &self.preflight_error {
            Some(var) => Err(AgentError::MissingCredential(var.clone())),
            None => Ok(()),
        }
    }

    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        self.calls.lock().unwrap().push(RecordedCall {
            at: Instant::now(),
            messages: request.messages.to_vec(),
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| reply(vec![text("Done.")]))
    }
}
