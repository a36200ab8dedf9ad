//! A tool server with one tool, `hello_world`.
//!
//! Reads newline-delimited JSON-RPC requests and answers each with one line.
//! It keeps no session state, so it works with clients that spawn it fresh
//! for every request.

use serde_json::{json, Value};
use toolwire::{
    methods, CallToolParams, CallToolResult, ErrorData, Implementation, InitializeResult,
    JsonRpcMessage, JsonRpcReply, ListToolsResult, RequestId, ServerCapabilities, ToolDescriptor,
};
use tracing::{debug, info};

pub const SERVER_NAME: &str = "hello-mcp";
pub const HELLO_TOOL: &str = "hello_world";

/// Request handler. Holds nothing between requests.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelloServer;

impl HelloServer {
    pub fn new() -> Self {
        Self
    }

    /// Handle one input line. Returns the reply line to write, or `None`
    /// for notifications and blank lines.
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcReply> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "unparseable request line");
                return Some(JsonRpcReply::failure(
                    None,
                    ErrorData::parse_error(format!("Parse error: {e}")),
                ));
            }
        };

        let id = value
            .get("id")
            .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());

        let message: JsonRpcMessage = match serde_json::from_value(value) {
            Ok(message) => message,
            Err(e) => {
                return Some(JsonRpcReply::failure(
                    id,
                    ErrorData::invalid_request(format!("Invalid request: {e}")),
                ));
            }
        };

        let Some(id) = message.id.clone() else {
            debug!(method = %message.method, "notification");
            return None;
        };

        let reply = match self.dispatch(&message) {
            Ok(result) => JsonRpcReply::success(id, result),
            Err(error) => JsonRpcReply::failure(Some(id), error),
        };
        Some(reply)
    }

    /// Route a request to its handler.
    pub fn dispatch(&self, message: &JsonRpcMessage) -> Result<Value, ErrorData> {
        match message.method.as_str() {
            methods::INITIALIZE => to_value(self.initialize()),
            methods::PING => Ok(json!({})),
            methods::TOOLS_LIST => to_value(ListToolsResult::all(self.tools())),
            methods::TOOLS_CALL => {
                let params: CallToolParams = message
                    .params
                    .clone()
                    .map(serde_json::from_value)
                    .transpose()
                    .map_err(|e| ErrorData::invalid_params(format!("Invalid call params: {e}")))?
                    .ok_or_else(|| ErrorData::invalid_params("Missing call params"))?;
                to_value(self.call_tool(&params)?)
            }
            other => Err(ErrorData::method_not_found(other)),
        }
    }

    fn initialize(&self) -> InitializeResult {
        InitializeResult::new(
            Implementation::new(SERVER_NAME, env!("CARGO_PKG_VERSION")),
            ServerCapabilities::default().enable_tools(),
        )
    }

    /// The catalog this server advertises.
    pub fn tools(&self) -> Vec<ToolDescriptor> {
        vec![ToolDescriptor::new(
            HELLO_TOOL,
            "Say hello to someone",
            json!({
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Name of the person to greet"
                    }
                },
                "required": ["name"]
            }),
        )]
    }

    /// Run a tool. Bad arguments come back as an error result, unknown tools
    /// as an RPC error.
    pub fn call_tool(&self, params: &CallToolParams) -> Result<CallToolResult, ErrorData> {
        if params.name != HELLO_TOOL {
            return Err(ErrorData::tool_not_found(&params.name));
        }

        let result = match params.arguments.get("name") {
            None | Some(Value::Null) => CallToolResult::error("name parameter is required"),
            Some(Value::String(name)) => {
                info!(%name, "greeting");
                CallToolResult::text(greeting(name))
            }
            Some(_) => CallToolResult::error("name must be a string"),
        };
        Ok(result)
    }
}

pub fn greeting(name: &str) -> String {
    format!("Hello, {name}! How are you doing today?")
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, ErrorData> {
    serde_json::to_value(value).map_err(|e| ErrorData::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(line: &str) -> Value {
        let reply = HelloServer::new().handle_line(line).expect("expected a reply");
        serde_json::to_value(reply).unwrap()
    }

    #[test]
    fn test_initialize() {
        let reply = reply(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}}}}"#,
        );
        assert_eq!(reply["id"], 1);
        assert_eq!(reply["result"]["serverInfo"]["name"], "hello-mcp");
        assert_eq!(reply["result"]["protocolVersion"], "2024-11-05");
        assert!(reply["result"]["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_tools_list() {
        let reply = reply(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#);
        let tools = reply["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "hello_world");
        assert_eq!(tools[0]["description"], "Say hello to someone");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["name"]));
        assert_eq!(
            tools[0]["inputSchema"]["properties"]["name"]["description"],
            "Name of the person to greet"
        );
    }

    #[test]
    fn test_greets() {
        let reply = reply(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"hello_world","arguments":{"name":"Ann"}}}"#,
        );
        assert_eq!(
            reply["result"]["content"][0],
            json!({ "type": "text", "text": "Hello, Ann! How are you doing today?" })
        );
        assert!(reply["result"].get("isError").is_none());
    }

    #[test]
    fn test_missing_name() {
        let reply = reply(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"hello_world","arguments":{}}}"#,
        );
        assert_eq!(reply["result"]["isError"], true);
        assert_eq!(
            reply["result"]["content"][0]["text"],
            "name parameter is required"
        );
    }

    #[test]
    fn test_non_string_name() {
        let reply = reply(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"hello_world","arguments":{"name":42}}}"#,
        );
        assert_eq!(reply["result"]["isError"], true);
        assert_eq!(reply["result"]["content"][0]["text"], "name must be a string");
    }

    #[test]
    fn test_unknown_tool() {
        let reply = reply(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"bogus","arguments":{}}}"#,
        );
        assert_eq!(reply["error"]["code"], ErrorData::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_missing_call_params() {
        let reply = reply(r#"{"jsonrpc":"2.0","id":1,"method":"tools/call"}"#);
        assert_eq!(reply["error"]["code"], ErrorData::INVALID_PARAMS);
    }

    #[test]
    fn test_unknown_method() {
        let reply = reply(r#"{"jsonrpc":"2.0","id":"abc","method":"resources/list"}"#);
        assert_eq!(reply["id"], "abc");
        assert_eq!(reply["error"]["code"], ErrorData::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_ping() {
        let reply = reply(r#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#);
        assert_eq!(reply["result"], json!({}));
    }

    #[test]
    fn test_parse_error_has_null_id() {
        let reply = reply("this is not json");
        assert!(reply["id"].is_null());
        assert_eq!(reply["error"]["code"], ErrorData::PARSE_ERROR);
    }

    #[test]
    fn test_invalid_request_keeps_id() {
        let reply = reply(r#"{"jsonrpc":"2.0","id":9}"#);
        assert_eq!(reply["id"], 9);
        assert_eq!(reply["error"]["code"], ErrorData::INVALID_REQUEST);
    }

    #[test]
    fn test_notifications_and_blank_lines_get_no_reply() {
        let server = HelloServer::new();
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .is_none());
        assert!(server.handle_line("   ").is_none());
    }
}
