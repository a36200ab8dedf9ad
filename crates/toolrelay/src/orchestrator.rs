//! Per-message orchestration.
//!
//! Each user message runs through the same fixed sequence:
//!
//! 1. discover tools (`initialize`, then `tools/list`), translated to
//!    function declarations
//! 2. ask the model, offering the catalog
//! 3. if the model asked for a tool, run it with `tools/call`
//! 4. send the user turn, the model's call and the tool's output back to the
//!    model and return its text
//!
//! Only one tool round is made per message. Nothing carries over between
//! messages.

use relayconf::RelayConfig;
use serde_json::Value;
use toolwire::{methods, InitializeParams, ListToolsResult};
use tracing::{debug, info, warn};

use crate::channel::{SpawnChannel, ToolChannel};
use crate::error::{ChannelError, ModelApiError, RelayError, ToolExecutionError};
use crate::gemini::{FunctionCall, FunctionDeclaration, Part, Turn};
use crate::model::{GeminiClient, ModelClient};
use crate::translate::{extract_result_text, parse_call_result, to_call_params, to_function_declarations};

/// Returned when the model produced no usable text.
pub const NO_RESPONSE: &str = "No response generated";

/// Where a message is in its journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    AwaitingTools,
    AwaitingModelDecision,
    AwaitingToolExecution,
    AwaitingFollowUp,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::AwaitingTools => "awaiting_tools",
            Stage::AwaitingModelDecision => "awaiting_model_decision",
            Stage::AwaitingToolExecution => "awaiting_tool_execution",
            Stage::AwaitingFollowUp => "awaiting_follow_up",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that happened while answering one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    /// The reply for the user.
    pub text: String,
    /// The tool the model asked for, if any.
    pub tool_call: Option<FunctionCall>,
    /// Text handed back to the model from that tool.
    pub tool_result: Option<String>,
    /// Turns sent on the last model request.
    pub conversation: Vec<Turn>,
}

/// Drives one message through tool discovery, the model and at most one
/// tool call.
#[derive(Debug)]
pub struct Orchestrator<C, M> {
    channel: C,
    model: M,
}

impl Orchestrator<SpawnChannel, GeminiClient> {
    /// Production wiring: spawn-per-call tool server plus HTTPS model client.
    pub fn from_config(config: &RelayConfig) -> Result<Self, ModelApiError> {
        let model = GeminiClient::from_config(&config.model)?;
        let channel = SpawnChannel::from_config(&config.tools);
        Ok(Self::new(channel, model))
    }
}

impl<C: ToolChannel, M: ModelClient> Orchestrator<C, M> {
    pub fn new(channel: C, model: M) -> Self {
        Self { channel, model }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Answer one user message.
    pub async fn process_message(&self, user_message: &str) -> Result<String, RelayError> {
        Ok(self.exchange(user_message).await?.text)
    }

    /// Answer one user message and report what was done along the way.
    #[tracing::instrument(name = "relay.message", skip_all, fields(message.len = user_message.len()))]
    pub async fn exchange(&self, user_message: &str) -> Result<Exchange, RelayError> {
        enter(Stage::AwaitingTools);
        let tools = self.available_tools().await?;

        enter(Stage::AwaitingModelDecision);
        let user_turn = Turn::user_text(user_message);
        let conversation = vec![user_turn.clone()];
        let candidate = self
            .model
            .generate(&conversation, &tools)
            .await
            .map_err(RelayError::Model)?;

        let call = match candidate.first_part() {
            Some(Part::FunctionCall(call)) => call.clone(),
            Some(Part::Text(text)) => {
                enter(Stage::Done);
                return Ok(Exchange {
                    text: text.clone(),
                    tool_call: None,
                    tool_result: None,
                    conversation,
                });
            }
            _ => {
                debug!(finish_reason = %candidate.finish_reason, "model returned nothing usable");
                enter(Stage::Done);
                return Ok(Exchange {
                    text: NO_RESPONSE.to_string(),
                    tool_call: None,
                    tool_result: None,
                    conversation,
                });
            }
        };

        enter(Stage::AwaitingToolExecution);
        info!(tool = %call.name, "model requested tool");
        let result_text = self
            .execute_tool(&call)
            .await
            .map_err(RelayError::ToolExecution)?;

        enter(Stage::AwaitingFollowUp);
        let conversation = vec![
            user_turn,
            Turn::model_call(call.clone()),
            Turn::function_result(call.name.clone(), result_text.clone()),
        ];
        let follow_up = self
            .model
            .generate(&conversation, &tools)
            .await
            .map_err(RelayError::FollowUp)?;

        let text = match follow_up.first_part() {
            Some(Part::Text(text)) => text.clone(),
            Some(Part::FunctionCall(next)) => {
                warn!(
                    tool = %next.name,
                    "model requested another tool; only one tool round is made per message"
                );
                NO_RESPONSE.to_string()
            }
            _ => NO_RESPONSE.to_string(),
        };

        enter(Stage::Done);
        Ok(Exchange {
            text,
            tool_call: Some(call),
            tool_result: Some(result_text),
            conversation,
        })
    }

    /// Discover the tool catalog, translated for the model.
    pub async fn available_tools(&self) -> Result<Vec<FunctionDeclaration>, RelayError> {
        let params = serde_json::to_value(InitializeParams::tools_only()).map_err(|source| {
            RelayError::Tools(ChannelError::Encode {
                method: methods::INITIALIZE.to_string(),
                source,
            })
        })?;
        self.channel
            .call(methods::INITIALIZE, Some(params))
            .await
            .map_err(RelayError::Tools)?;

        let listing = self
            .channel
            .call(methods::TOOLS_LIST, None)
            .await
            .map_err(RelayError::Tools)?;
        let listing = parse_listing(listing).map_err(RelayError::Tools)?;

        if listing.next_cursor.is_some() {
            warn!("tool server paginated its catalog; only the first page is offered");
        }
        debug!(count = listing.tools.len(), "discovered tools");
        Ok(to_function_declarations(&listing.tools))
    }

    async fn execute_tool(&self, call: &FunctionCall) -> Result<String, ToolExecutionError> {
        let params =
            serde_json::to_value(to_call_params(call)).map_err(|e| ToolExecutionError::Malformed {
                tool: call.name.clone(),
                message: e.to_string(),
            })?;

        let value = match self.channel.call(methods::TOOLS_CALL, Some(params)).await {
            Ok(value) => value,
            Err(ChannelError::Rejected { error, .. }) => {
                return Err(ToolExecutionError::Rejected {
                    tool: call.name.clone(),
                    error,
                })
            }
            Err(err) => return Err(ToolExecutionError::Channel(err)),
        };

        let result = parse_call_result(value).map_err(|e| ToolExecutionError::Malformed {
            tool: call.name.clone(),
            message: e.to_string(),
        })?;

        if result.is_error {
            return Err(ToolExecutionError::Failed {
                tool: call.name.clone(),
                message: result
                    .first_text()
                    .unwrap_or("tool reported an error")
                    .to_string(),
            });
        }

        Ok(extract_result_text(&result))
    }
}

fn enter(stage: Stage) {
    debug!(stage = %stage, "stage");
}

fn parse_listing(value: Value) -> Result<ListToolsResult, ChannelError> {
    if value.is_null() {
        return Ok(ListToolsResult::default());
    }
    serde_json::from_value(value).map_err(|e| ChannelError::Decode {
        method: methods::TOOLS_LIST.to_string(),
        message: e.to_string(),
        output: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::AwaitingTools.to_string(), "awaiting_tools");
        assert_eq!(Stage::Done.to_string(), "done");
    }

    #[test]
    fn test_parse_listing() {
        let listing = parse_listing(json!({
            "tools": [{ "name": "hello_world", "description": "Say hello to someone" }]
        }))
        .unwrap();
        assert_eq!(listing.tools.len(), 1);

        assert!(parse_listing(Value::Null).unwrap().tools.is_empty());
        assert!(parse_listing(json!({})).unwrap().tools.is_empty());
        assert!(matches!(
            parse_listing(json!({ "tools": "nope" })),
            Err(ChannelError::Decode { .. })
        ));
    }

    #[test]
    fn test_from_config() {
        let mut config = RelayConfig::default();
        config.model.endpoint = "https://example.test/generate".to_string();
        config.tools.command = "/opt/tools/hello-mcp".into();

        let orchestrator = Orchestrator::from_config(&config).unwrap();
        assert_eq!(orchestrator.model().endpoint(), "https://example.test/generate");
        assert_eq!(
            orchestrator.channel().command(),
            std::path::Path::new("/opt/tools/hello-mcp")
        );
    }
}
