//! JSON-RPC 2.0 Types
//!
//! Envelope types for the request/reply exchange with a tool server.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorData;

/// The `"jsonrpc": "2.0"` member. Any other value fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub struct JsonRpcVersion;

impl JsonRpcVersion {
    pub const TAG: &'static str = "2.0";
}

impl TryFrom<String> for JsonRpcVersion {
    type Error = String;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        if tag == Self::TAG {
            Ok(JsonRpcVersion)
        } else {
            Err(format!("unsupported jsonrpc version {tag:?}"))
        }
    }
}

impl From<JsonRpcVersion> for &'static str {
    fn from(_: JsonRpcVersion) -> Self {
        JsonRpcVersion::TAG
    }
}

/// Integer or string request id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(id) => write!(f, "{id}"),
            RequestId::String(id) => f.write_str(id),
        }
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

/// Outgoing request. `params` is left out of the JSON when `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: JsonRpcVersion,
    pub id: RequestId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<RequestId>, method: impl Into<String>) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    pub fn with_params(id: impl Into<RequestId>, method: impl Into<String>, params: Value) -> Self {
        Self {
            params: Some(params),
            ..Self::new(id, method)
        }
    }
}

/// A JSON-RPC 2.0 reply: exactly one of `result` or `error` is expected.
///
/// `id` is `null` only when the server could not read the request id
/// (parse errors).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcReply {
    pub jsonrpc: JsonRpcVersion,
    pub id: Option<RequestId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl JsonRpcReply {
    /// Create a successful reply.
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id: Some(id.into()),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error reply. `id` is `None` when the request was unreadable.
    pub fn failure(id: Option<RequestId>, error: ErrorData) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Split into the result value or the error object.
    ///
    /// A reply with neither member yields `Value::Null`.
    pub fn into_result(self) -> Result<Value, ErrorData> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A message as a server reads it: a request, or a notification when `id`
/// is absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcMessage {
    pub jsonrpc: JsonRpcVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcMessage {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}
