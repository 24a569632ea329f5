//! Text statistics tool.
//!
//! Returns the line listing as a truncatable field, so long inputs can be
//! shortened for context without losing the counts.

use async_trait::async_trait;

use baton_core::{
    ParamType, Tool, ToolCallContext, ToolDefinition, ToolError, ToolParameter, ToolResult,
};

pub struct TextStatsTool;

#[async_trait]
impl Tool for TextStatsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new("text_stats", "Count lines, words, and characters in a text.")
            .with_parameter(ToolParameter::required(
                "text",
                ParamType::String,
                "The text to measure",
            ))
    }

    async fn execute(
        &self,
        _ctx: &ToolCallContext,
        arguments: serde_json::Value,
    ) -> Result<ToolResult, ToolError> {
        let text = arguments["text"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'text'".into()))?;

        let lines: Vec<&str> = text.lines().collect();
        let result = ToolResult::ok(serde_json::json!({
            "line_count": lines.len(),
            "word_count": text.split_whitespace().count(),
            "char_count": text.chars().count(),
            "lines": lines,
        }));

        Ok(result.with_truncatable(["lines"]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ToolCallContext {
        ToolCallContext::new(baton_core::TaskId::new(), "tester")
    }

    #[tokio::test]
    async fn counts_lines_words_and_chars() {
        let result = TextStatsTool
            .execute(
                &ctx(),
                serde_json::json!({"text": "one two\nthree\nfour five six"}),
            )
            .await
            .unwrap();

        assert!(result.success);
        let payload = result.result.as_ref().unwrap();
        assert_eq!(payload["line_count"], 3);
        assert_eq!(payload["word_count"], 6);
        assert_eq!(payload["char_count"], 27);
        assert_eq!(result.truncatable_fields, vec!["lines"]);
    }

    #[tokio::test]
    async fn empty_text_measures_zero() {
        let result = TextStatsTool
            .execute(&ctx(), serde_json::json!({"text": ""}))
            .await
            .unwrap();

        let payload = result.result.unwrap();
        assert_eq!(payload["line_count"], 0);
        assert_eq!(payload["word_count"], 0);
        assert_eq!(payload["char_count"], 0);
    }

    #[tokio::test]
    async fn truncation_shortens_lines_but_keeps_counts() {
        let text = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let mut result = TextStatsTool
            .execute(&ctx(), serde_json::json!({"text": text}))
            .await
            .unwrap();

        result.truncate_for_context(3);

        let payload = result.result.unwrap();
        assert_eq!(payload["lines"].as_array().unwrap().len(), 3);
        assert_eq!(payload["line_count"], 10);
        assert!(result.truncation_note.unwrap().contains("'lines'"));
    }
}
