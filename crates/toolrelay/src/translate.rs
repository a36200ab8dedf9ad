//! Conversion between tool-server descriptors/results and model declarations.

use serde_json::{Map, Value};
use toolwire::{CallToolParams, CallToolResult, Content, ToolDescriptor};

use crate::gemini::{FunctionCall, FunctionDeclaration};

/// Text handed to the model when a tool returns no text content.
pub const TOOL_SUCCESS_FALLBACK: &str = "Tool executed successfully";

/// Convert a tool catalog into function declarations.
///
/// One declaration per descriptor, same order, input schema passed through
/// unchanged.
pub fn to_function_declarations(tools: &[ToolDescriptor]) -> Vec<FunctionDeclaration> {
    tools.iter().map(to_function_declaration).collect()
}

fn to_function_declaration(tool: &ToolDescriptor) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: tool.input_schema.clone(),
    }
}

/// Build `tools/call` params from the model's function call.
pub fn to_call_params(call: &FunctionCall) -> CallToolParams {
    CallToolParams {
        name: call.name.clone(),
        arguments: call.args.clone(),
    }
}

/// The text to hand back to the model for a tool result.
///
/// Uses the first text block; falls back to [`TOOL_SUCCESS_FALLBACK`] when
/// there is none (empty content, images only, ...).
pub fn extract_result_text(result: &CallToolResult) -> String {
    result
        .first_text()
        .map(str::to_string)
        .unwrap_or_else(|| TOOL_SUCCESS_FALLBACK.to_string())
}

/// Decode a raw `tools/call` result value.
///
/// Only a non-object result is an error. `null` reads as an empty result, a
/// missing or non-array `content` as no blocks, and a block that does not
/// decode as any known content type as [`Content::Unsupported`].
pub fn parse_call_result(value: Value) -> Result<CallToolResult, serde_json::Error> {
    if value.is_null() {
        return Ok(CallToolResult::default());
    }
    let mut fields: Map<String, Value> = serde_json::from_value(value)?;

    let content = match fields.remove("content") {
        Some(Value::Array(blocks)) => blocks
            .into_iter()
            .map(|block| serde_json::from_value(block).unwrap_or(Content::Unsupported))
            .collect(),
        _ => Vec::new(),
    };

    Ok(CallToolResult {
        content,
        is_error: fields
            .get("isError")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        structured_content: fields.remove("structuredContent"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hello_tool() -> ToolDescriptor {
        ToolDescriptor::new(
            "hello_world",
            "Say hello to someone",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name of the person to greet" }
                },
                "required": ["name"]
            }),
        )
    }

    #[test]
    fn test_declarations_preserve_order_and_fields() {
        let tools = vec![
            hello_tool(),
            ToolDescriptor::new("b", "second", json!({ "type": "object" })),
            ToolDescriptor::new("a", "", json!({ "type": "object", "properties": {} })),
        ];

        let declarations = to_function_declarations(&tools);
        assert_eq!(declarations.len(), tools.len());
        for (tool, declaration) in tools.iter().zip(&declarations) {
            assert_eq!(declaration.name, tool.name);
            assert_eq!(declaration.description, tool.description);
            assert_eq!(declaration.parameters, tool.input_schema);
        }
    }

    #[test]
    fn test_empty_catalog() {
        assert!(to_function_declarations(&[]).is_empty());
    }

    #[test]
    fn test_call_params_copy_args() {
        let call = FunctionCall {
            name: "hello_world".to_string(),
            args: serde_json::from_value(json!({ "name": "Ann" })).unwrap(),
        };
        let params = to_call_params(&call);
        assert_eq!(params.name, "hello_world");
        assert_eq!(params.arguments["name"], "Ann");
    }

    #[test]
    fn test_extract_first_text() {
        let result = CallToolResult::text("Hello, Ann! How are you doing today?");
        assert_eq!(
            extract_result_text(&result),
            "Hello, Ann! How are you doing today?"
        );
    }

    #[test]
    fn test_extract_skips_leading_image() {
        let result = parse_call_result(json!({
            "content": [
                { "type": "image", "data": "AAAA", "mimeType": "image/png" },
                { "type": "text", "text": "caption" }
            ]
        }))
        .unwrap();
        assert_eq!(extract_result_text(&result), "caption");
    }

    #[test]
    fn test_extract_fallback() {
        let result = parse_call_result(json!({ "content": [] })).unwrap();
        assert_eq!(extract_result_text(&result), TOOL_SUCCESS_FALLBACK);

        let result = parse_call_result(Value::Null).unwrap();
        assert_eq!(extract_result_text(&result), TOOL_SUCCESS_FALLBACK);

        let result = parse_call_result(json!({
            "content": [{ "type": "image", "data": "AAAA", "mimeType": "image/png" }]
        }))
        .unwrap();
        assert_eq!(extract_result_text(&result), TOOL_SUCCESS_FALLBACK);
    }

    #[test]
    fn test_parse_tolerates_imperfect_content() {
        for value in [
            json!({ "content": null }),
            json!({ "content": "not a list" }),
            json!({ "isError": null }),
            json!({ "content": [{ "type": "image", "data": "AAAA" }] }),
            json!({ "content": [{ "type": "text" }] }),
            json!({ "content": [{ "type": "text", "text": 42 }, "stray"] }),
        ] {
            let result = parse_call_result(value.clone()).unwrap();
            assert!(!result.is_error, "{value}");
            assert_eq!(extract_result_text(&result), TOOL_SUCCESS_FALLBACK, "{value}");
        }
    }

    #[test]
    fn test_parse_keeps_text_after_broken_block() {
        let result = parse_call_result(json!({
            "content": [{ "type": "text" }, { "type": "text", "text": "second" }],
            "isError": true
        }))
        .unwrap();
        assert!(result.is_error);
        assert_eq!(extract_result_text(&result), "second");
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(parse_call_result(json!("done")).is_err());
        assert!(parse_call_result(json!([{ "type": "text", "text": "hi" }])).is_err());
    }
}
