//! JSON query tool: pointer lookup into a document.

use async_trait::async_trait;

use baton_core::{
    ParamType, Tool, ToolCallContext, ToolDefinition, ToolError, ToolParameter, ToolResult,
};

pub struct JsonQueryTool;

#[async_trait]
impl Tool for JsonQueryTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "json_query",
            "Look up a value in a JSON document by JSON Pointer (RFC 6901).",
        )
        .with_parameter(ToolParameter::required(
            "data",
            ParamType::Object,
            "The JSON document to query",
        ))
        .with_parameter(ToolParameter::required(
            "pointer",
            ParamType::String,
            "Pointer to the wanted value, e.g. '/items/0/name'; '' selects the whole document",
        ))
    }

    async fn execute(
        &self,
        _ctx: &ToolCallContext,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let pointer = arguments["pointer"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'pointer'".into()))?;

        match arguments["data"].pointer(pointer) {
            Some(value) => Ok(ToolResult::ok(serde_json::json!({
                "pointer": pointer,
                "value": value,
            }))),
            None => Ok(ToolResult::failed(format!("no value at pointer '{pointer}'"))),
        }
    }
}
