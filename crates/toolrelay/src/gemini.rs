//! Model-side conversation types (Gemini `generateContent` shape).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Author of a turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Model,
    Function,
}

/// A request from the model to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

/// A tool's output handed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Map<String, Value>,
}

impl FunctionResponse {
    /// Wrap tool output text as `{"result": text}`.
    pub fn result(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut response = Map::new();
        response.insert("result".to_string(), Value::String(text.into()));
        Self {
            name: name.into(),
            response,
        }
    }
}

/// One content part. Serializes as a single-key object
/// (`{"text":..}`, `{"functionCall":..}` or `{"functionResponse":..}`).
///
/// Decoding rejects parts carrying none or several of those keys; any other
/// keys the service adds are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPart")]
pub enum Part {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
    #[serde(default)]
    function_response: Option<FunctionResponse>,
}

impl TryFrom<RawPart> for Part {
    type Error = String;

    fn try_from(raw: RawPart) -> Result<Self, Self::Error> {
        match (raw.text, raw.function_call, raw.function_response) {
            (Some(text), None, None) => Ok(Part::Text(text)),
            (None, Some(call), None) => Ok(Part::FunctionCall(call)),
            (None, None, Some(response)) => Ok(Part::FunctionResponse(response)),
            (None, None, None) => Err(
                "part has none of text, functionCall, functionResponse".to_string(),
            ),
            _ => Err("part has more than one of text, functionCall, functionResponse".to_string()),
        }
    }
}

impl Part {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_function_call(&self) -> Option<&FunctionCall> {
        match self {
            Part::FunctionCall(call) => Some(call),
            _ => None,
        }
    }
}

/// One conversation turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Turn {
    /// The user's message.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// A model turn restating the function call it made.
    pub fn model_call(call: FunctionCall) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::FunctionCall(call)],
        }
    }

    /// A function turn carrying a tool's output.
    pub fn function_result(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: Role::Function,
            parts: vec![Part::FunctionResponse(FunctionResponse::result(name, text))],
        }
    }
}

/// A tool as the model sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Wrapper the endpoint expects around declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolGroup {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Request body for `generateContent`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest<'a> {
    pub contents: &'a [Turn],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolGroup>,
}

impl<'a> GenerateRequest<'a> {
    /// An empty catalog sends no `tools` member at all.
    pub fn new(contents: &'a [Turn], declarations: &[FunctionDeclaration]) -> Self {
        let tools = if declarations.is_empty() {
            Vec::new()
        } else {
            vec![ToolGroup {
                function_declarations: declarations.to_vec(),
            }]
        };
        Self { contents, tools }
    }
}

/// Response body of `generateContent`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated alternative. Only the first is ever used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Turn,
    #[serde(default)]
    pub finish_reason: String,
}

impl Candidate {
    pub fn first_part(&self) -> Option<&Part> {
        self.content.parts.first()
    }
}
