//! [`ModelClient`] backed by the `genai` crate.
//!
//! Maps the provider-neutral conversation onto a [`ChatRequest`], declares
//! the tool catalog as [`Tool`] schemas, and classifies provider failures into
//! rate-limit vs generic [`ModelError`]s.

use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest, Tool, ToolCall, ToolResponse};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, ModelIden};

use super::catalog::ToolSpec;
use super::model::{
    ContentBlock, Message, ModelClient, ModelRequest, ModelResponse, StopReason, ToolCallRequest,
};
use crate::config::{AgentConfig, API_KEY_VAR};
use crate::error::{AgentError, ModelError};

pub struct GenaiClient {
    client: Client,
    model: String,
    options: ChatOptions,
    has_credential: bool,
}

impl GenaiClient {
    /// Build a client for `config.model`. The key, if any, is handed to
    /// `genai` through an auth resolver rather than the process environment.
    pub fn new(config: &AgentConfig, api_key: Option<String>) -> Self {
        let has_credential = api_key.is_some();
        let client = match api_key {
            Some(key) => {
                let resolver = AuthResolver::from_resolver_fn(
                    move |_: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
                        Ok(Some(AuthData::from_single(key.clone())))
                    },
                );
                Client::builder().with_auth_resolver(resolver).build()
            }
            None => Client::default(),
        };

        let options = ChatOptions::default()
            .with_max_tokens(config.max_tokens)
            .with_temperature(config.temperature);

        Self {
            client,
            model: config.model.clone(),
            options,
            has_credential,
        }
    }
}

#[async_trait]
impl ModelClient for GenaiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn preflight(&self) -> Result<(), AgentError> {
        if self.has_credential {
            Ok(())
        } else {
            Err(AgentError::MissingCredential(API_KEY_VAR.to_string()))
        }
    }

    async fn complete(&self, request: &ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let chat_req = build_chat_request(request);

        let response = self
            .client
            .exec_chat(&self.model, chat_req, Some(&self.options))
            .await
            .map_err(|e| classify_error(&e.to_string()))?;

        let mut content: Vec<ContentBlock> = response
            .texts()
            .into_iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| ContentBlock::Text(t.to_string()))
            .collect();

        let calls = response.into_tool_calls();
        let stop_reason = if calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        };
        content.extend(calls.into_iter().map(|call| {
            ContentBlock::ToolUse(ToolCallRequest {
                id: call.call_id,
                name: call.fn_name,
                input: call.fn_arguments,
            })
        }));

        Ok(ModelResponse {
            content,
            stop_reason,
        })
    }
}

fn build_chat_request(request: &ModelRequest<'_>) -> ChatRequest {
    let mut chat_req = ChatRequest::from_system(request.system)
        .with_tools(request.tools.iter().map(to_tool).collect::<Vec<_>>());

    for message in request.messages {
        match message {
            Message::User(text) => {
                chat_req = chat_req.append_message(ChatMessage::user(text.as_str()));
            }
            Message::Assistant(blocks) => {
                let text = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text(t) => Some(t.as_str()),
                        ContentBlock::ToolUse(_) => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                if !text.is_empty() {
                    chat_req = chat_req.append_message(ChatMessage::assistant(text));
                }

                let calls: Vec<ToolCall> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolUse(call) => Some(ToolCall {
                            call_id: call.id.clone(),
                            fn_name: call.name.clone(),
                            fn_arguments: call.input.clone(),
                            thought_signatures: None,
                        }),
                        ContentBlock::Text(_) => None,
                    })
                    .collect();
                if !calls.is_empty() {
                    chat_req = chat_req.append_message(ChatMessage::from(calls));
                }
            }
            Message::ToolResults(results) => {
                for result in results {
                    chat_req = chat_req.append_message(ToolResponse::new(
                        result.tool_use_id.clone(),
                        result.content.clone(),
                    ));
                }
            }
        }
    }

    chat_req
}

fn to_tool(spec: &ToolSpec) -> Tool {
    Tool::new(spec.name.as_str())
        .with_description(spec.description)
        .with_schema(spec.input_schema())
}

/// Rate limiting is recognised from the provider's error text: HTTP 429 or
/// an explicit rate-limit/overload message.
fn classify_error(message: &str) -> ModelError {
    let lower = message.to_lowercase();
    let rate_limited = ["429", "rate limit", "rate_limit", "overloaded"]
        .iter()
        .any(|needle| lower.contains(needle));

    if rate_limited {
        ModelError::RateLimited {
            message: message.to_string(),
            retry_after: None,
        }
    } else {
        ModelError::Api(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::catalog::catalog;
    use crate::agent::model::ToolResultBlock;
    use serde_json::json;

    #[test]
    fn classifies_rate_limit_errors() {
        assert!(matches!(
            classify_error("Web call failed: status 429 Too Many Requests"),
            ModelError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_error("{\"type\":\"rate_limit_error\"}"),
            ModelError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_error("Overloaded"),
            ModelError::RateLimited { .. }
        ));
        assert!(matches!(
            classify_error("invalid x-api-key"),
            ModelError::Api(_)
        ));
    }

    #[test]
    fn request_carries_every_message_and_tool() {
        let messages = vec![
            Message::User("Execute your highest priority task.".into()),
            Message::Assistant(vec![
                ContentBlock::Text("Reading first.".into()),
                ContentBlock::ToolUse(ToolCallRequest {
                    id: "toolu_1".into(),
                    name: "read_file".into(),
                    input: json!({"path": "README.md"}),
                }),
            ]),
            Message::ToolResults(vec![ToolResultBlock {
                tool_use_id: "toolu_1".into(),
                content: "{\"content\":\"hi\"}".into(),
                is_error: false,
            }]),
        ];
        let request = ModelRequest {
            system: "You are PM-Test.",
            messages: &messages,
            tools: catalog(),
        };

        let chat_req = build_chat_request(&request);
        assert_eq!(chat_req.system.as_deref(), Some("You are PM-Test."));
        // user, assistant text, assistant tool calls, tool response
        assert_eq!(chat_req.messages.len(), 4);
        assert_eq!(chat_req.tools.as_ref().map(Vec::len), Some(14));
    }

    #[tokio::test]
    async fn preflight_requires_a_credential() {
        let config = crate::config::PartialConfig::default().finalize().agent;
        let client = GenaiClient::new(&config, None);
        let err = client.preflight().await.unwrap_err();
        assert_eq!(err.to_string(), "Missing API key: ANTHROPIC_API_KEY not set");

        let client = GenaiClient::new(&config, Some("sk-test".into()));
        assert!(client.preflight().await.is_ok());
        assert_eq!(client.model_name(), "claude-3-haiku-20240307");
    }
}
