//! Translation between rmcp's model types and the toolloop tool shapes

use rmcp::model::{CallToolRequestParams, CallToolResult, Content, RawContent, Tool};
use serde_json::Value;
use toolloop_core::{CatalogEntry, GatewayError, GatewayResult, ToolInvocation, ToolOutput};

/// Catalog entry for an advertised MCP tool. The input schema is copied as is.
pub fn catalog_entry(tool: &Tool) -> CatalogEntry {
    CatalogEntry {
        name: tool.name.to_string(),
        description: tool.description.as_ref().map(|d| d.to_string()),
        input_schema: Value::Object((*tool.input_schema).clone()),
    }
}

/// `tools/call` parameters for an invocation.
pub fn call_params(invocation: &ToolInvocation) -> CallToolRequestParams {
    CallToolRequestParams {
        meta: None,
        name: invocation.name.clone().into(),
        arguments: Some(invocation.arguments_object()),
        task: None,
    }
}

/// Gateway output for a call result.
///
/// A result flagged `is_error` is a tool-side failure and becomes
/// [`GatewayError::ToolReported`] with the result's text.
pub fn tool_output(result: CallToolResult) -> GatewayResult<ToolOutput> {
    if result.is_error.unwrap_or(false) {
        return Err(GatewayError::ToolReported(extract_text(&result.content)));
    }

    let content = serde_json::to_value(&result.content)
        .map_err(|e| GatewayError::Protocol(format!("unserializable tool content: {e}")))?;
    Ok(ToolOutput::new(content))
}

/// Text items of a result joined with newlines.
pub fn extract_text(content: &[Content]) -> String {
    content
        .iter()
        .filter_map(|item| match &item.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_catalog_entry_keeps_schema() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
            "required": ["a", "b"]
        });
        let Value::Object(map) = schema.clone() else {
            unreachable!()
        };
        let tool = Tool::new("add", "Add two numbers", Arc::new(map));

        let entry = catalog_entry(&tool);
        assert_eq!(entry.name, "add");
        assert_eq!(entry.description.as_deref(), Some("Add two numbers"));
        assert_eq!(entry.input_schema, schema);
    }

    #[rstest]
    #[case::object(json!({"a": 2, "b": 2}), json!({"a": 2, "b": 2}))]
    #[case::null(Value::Null, json!({}))]
    #[case::scalar(json!(7), json!({"input": 7}))]
    #[case::array(json!([1, 2]), json!({"input": [1, 2]}))]
    fn test_call_params_wrap_arguments(#[case] input: Value, #[case] expected: Value) {
        let params = call_params(&ToolInvocation::new("add", input));
        assert_eq!(params.name, "add");
        assert_eq!(params.arguments.map(Value::Object), Some(expected));
    }

    #[test]
    fn test_successful_result_keeps_typed_items() {
        let output = tool_output(CallToolResult::success(vec![Content::text("4")])).unwrap();
        assert_eq!(output.content, json!([{"type": "text", "text": "4"}]));
    }

    #[test]
    fn test_error_result_becomes_tool_reported() {
        let err = tool_output(CallToolResult::error(vec![
            Content::text("Division by zero"),
            Content::text("b must not be 0"),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            GatewayError::ToolReported(msg) if msg == "Division by zero\nb must not be 0"
        ));
    }
}
