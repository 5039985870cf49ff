//! Provider-neutral conversation types and the [`ModelClient`] seam.
//!
//! The agent loop only ever talks to a `dyn ModelClient`; the production
//! implementation lives in [`super::genai_client`], tests use a scripted
//! in-memory client.

use async_trait::async_trait;
use serde_json::Value;

use super::catalog::ToolSpec;
use crate::error::{AgentError, ModelError};

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    /// Provider-assigned call id; echoed back on the matching result.
    pub id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text(String),
    ToolUse(ToolCallRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    /// JSON-encoded tool payload or `{"error": ...}` object.
    pub content: String,
    pub is_error: bool,
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    User(String),
    Assistant(Vec<ContentBlock>),
    /// Results for every tool use of the preceding assistant message.
    ToolResults(Vec<ToolResultBlock>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
}

impl ModelResponse {
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolCallRequest> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::ToolUse(call) => Some(call),
            ContentBlock::Text(_) => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|b| match b {
            ContentBlock::Text(text) => Some(text.as_str()),
            ContentBlock::ToolUse(_) => None,
        })
    }
}

/// Everything sent to the model for one turn.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub system: &'a str,
    pub messages: &'a [Message],
    pub tools: &'static [ToolSpec],
}

/// A conversational model that supports tool use.
#[async_trait]
pub trait ModelClient: Send + Sync {
    fn model_name(&self) -> &str;

    /// Configuration check run once before an agent's first turn.
    async fn preflight(&self) -> Result<(), AgentError> {
        Ok(())
    }

    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError>;
}
