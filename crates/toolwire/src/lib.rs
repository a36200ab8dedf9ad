//! toolwire - wire types for the stdio tool protocol
//!
//! The subset of MCP that a tool-calling orchestrator needs: the JSON-RPC 2.0
//! envelope, the `initialize` handshake, `tools/list` and `tools/call`.
//!
//! # Example
//!
//! ```rust
//! use toolwire::{JsonRpcRequest, JsonRpcReply};
//! use serde_json::json;
//!
//! let request = JsonRpcRequest::with_params(1, "tools/call", json!({ "name": "hello_world" }));
//! let line = serde_json::to_string(&request).unwrap();
//! assert!(line.contains("\"method\":\"tools/call\""));
//!
//! let reply: JsonRpcReply = serde_json::from_str(
//!     r#"{"jsonrpc":"2.0","id":1,"result":{"content":[]}}"#,
//! ).unwrap();
//! assert!(reply.into_result().is_ok());
//! ```

pub mod content;
pub mod error;
pub mod jsonrpc;
pub mod protocol;
pub mod tool;

pub use content::Content;
pub use error::ErrorData;
pub use jsonrpc::{JsonRpcMessage, JsonRpcReply, JsonRpcRequest, JsonRpcVersion, RequestId};
pub use protocol::{
    ClientCapabilities, Implementation, InitializeParams, InitializeResult, ServerCapabilities,
    ToolsCapability, PROTOCOL_VERSION,
};
pub use tool::{CallToolParams, CallToolResult, ListToolsResult, ToolDescriptor};

/// Method names spoken over the wire.
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const PING: &str = "ping";
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";
}
