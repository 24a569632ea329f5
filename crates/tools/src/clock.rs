//! Clock tool: reads the current UTC time.

use async_trait::async_trait;
use chrono::Utc;

use baton_core::{
    ParamType, Tool, ToolCallContext, ToolDefinition, ToolError, ToolParameter, ToolResult,
};

pub struct ClockTool;

#[async_trait]
impl Tool for ClockTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("clock", "Read the current UTC time.")
            .with_parameter(ToolParameter::optional(
                "format",
                ParamType::String,
                serde_json::json!("rfc3339"),
                "Output format: 'rfc3339' or 'unix'",
            ))
            .with_timeout_ms(5_000)
    }

    async fn execute(
        &self,
        _ctx: &ToolCallContext,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let format = arguments["format"].as_str().unwrap_or("rfc3339");
        let now = Utc::now();
        let rendered = match format {
            "rfc3339" => now.to_rfc3339(),
            "unix" => now.timestamp().to_string(),
            other => {
                return Ok(ToolResult::failed(format!(
                    "unsupported format '{other}', expected 'rfc3339' or 'unix'"
                )));
            }
        };

        Ok(ToolResult::ok(serde_json::json!({
            "now": rendered,
            "unix": now.timestamp(),
        })))
    }
}
