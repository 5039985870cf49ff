pub mod agent_loop;
pub mod audit;
pub mod catalog;
pub mod documents;
pub mod executor;
pub mod genai_client;
pub mod model;
pub mod system_prompt;
pub mod tools;

use std::sync::Arc;

use documents::{MarkdownDocuments, WorkDocuments};

use crate::config::AppConfig;
use crate::safety::SafetyLayer;

pub use agent_loop::run_agent;

/// Read-only collaborators shared by every agent run in a process.
#[derive(Clone)]
pub struct RunContext {
    pub config: Arc<AppConfig>,
    pub safety: Arc<SafetyLayer>,
    pub documents: Arc<dyn WorkDocuments>,
}

impl RunContext {
    /// Compile the safety layer and open the markdown documents under the
    /// configured docs directory.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let safety = SafetyLayer::new(&config)?;
        let documents = MarkdownDocuments::new(config.agents_dir(), config.handoffs_path());
        Ok(Self {
            config: Arc::new(config),
            safety: Arc::new(safety),
            documents: Arc::new(documents),
        })
    }

    /// Swap the document store, e.g. for an in-memory one in tests.
    pub fn with_documents(mut self, documents: Arc<dyn WorkDocuments>) -> Self {
        self.documents = documents;
        self
    }
}
