//! Reasoning steps, the entries of the execution ledger.
//!
//! Every observable action the engine takes (a thought, a tool call, a tool
//! result, the final synthesis) becomes one immutable step. Steps are
//! numbered on append by the owning chain and never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier linking a tool_call step to its tool_result step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who may observe a step or event.
///
/// `Hidden` is never emitted to consumers; `Summary` passes for consumers
/// configured at summary or full; `Full` passes only at full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Full,
    Summary,
    Hidden,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Full
    }
}

/// The kind of a reasoning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Thinking,
    ToolCall,
    ToolResult,
    Synthesis,
}

/// Kind-specific payload of a reasoning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepPayload {
    /// A model thought, or a parse diagnostic standing in for one.
    Thinking { text: String },

    /// A tool invocation, recorded before the tool runs.
    ToolCall {
        tool_name: String,
        tool_type: String,
        arguments: serde_json::Value,
        correlation_id: CorrelationId,
    },

    /// The outcome of a tool invocation, keyed back by correlation id.
    ToolResult {
        correlation_id: CorrelationId,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// The final answer, with the steps it drew on.
    Synthesis {
        answer: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        source_steps: Vec<u64>,
    },
}

impl StepPayload {
    pub fn kind(&self) -> StepKind {
        match self {
            StepPayload::Thinking { .. } => StepKind::Thinking,
            StepPayload::ToolCall { .. } => StepKind::ToolCall,
            StepPayload::ToolResult { .. } => StepKind::ToolResult,
            StepPayload::Synthesis { .. } => StepKind::Synthesis,
        }
    }
}

/// One immutable entry in a reasoning chain.
///
/// `seq` is assigned by the chain on append (position at append time) and is
/// 0 until then.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    /// Position in the chain, assigned on append
    pub seq: u64,

    /// When the step was produced
    pub timestamp: DateTime<Utc>,

    /// Optional reference to the step this one elaborates on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_seq: Option<u64>,

    /// Who may observe this step
    #[serde(default)]
    pub visibility: Visibility,

    /// Tokens consumed producing this step, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,

    /// Cost in USD of producing this step, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,

    /// Kind-specific payload
    #[serde(flatten)]
    pub payload: StepPayload,
}

impl ReasoningStep {
    fn with_payload(payload: StepPayload) -> Self {
        Self {
            seq: 0,
            timestamp: Utc::now(),
            parent_seq: None,
            visibility: Visibility::default(),
            tokens: None,
            cost_usd: None,
            payload,
        }
    }

    /// A thought step.
    pub fn thinking(text: impl Into<String>) -> Self {
        Self::with_payload(StepPayload::Thinking { text: text.into() })
    }

    /// A tool_call step, recorded before invocation.
    pub fn tool_call(
        tool_name: impl Into<String>,
        tool_type: impl Into<String>,
        arguments: serde_json::Value,
        correlation_id: CorrelationId,
    ) -> Self {
        Self::with_payload(StepPayload::ToolCall {
            tool_name: tool_name.into(),
            tool_type: tool_type.into(),
            arguments,
            correlation_id,
        })
    }

    /// A successful tool_result step.
    pub fn tool_result_ok(correlation_id: CorrelationId, result: serde_json::Value) -> Self {
        Self::with_payload(StepPayload::ToolResult {
            correlation_id,
            success: true,
            result: Some(result),
            error: None,
        })
    }

    /// A failed tool_result step.
    pub fn tool_result_err(correlation_id: CorrelationId, error: impl Into<String>) -> Self {
        Self::with_payload(StepPayload::ToolResult {
            correlation_id,
            success: false,
            result: None,
            error: Some(error.into()),
        })
    }

    /// The synthesis step carrying the final answer.
    pub fn synthesis(answer: impl Into<String>, source_steps: Vec<u64>) -> Self {
        Self::with_payload(StepPayload::Synthesis {
            answer: answer.into(),
            source_steps,
        })
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_parent(mut self, parent_seq: u64) -> Self {
        self.parent_seq = Some(parent_seq);
        self
    }

    /// Attach token/cost counters (e.g. from the completion that produced a
    /// thought).
    pub fn with_usage(mut self, tokens: u32, cost_usd: f64) -> Self {
        self.tokens = Some(tokens);
        self.cost_usd = Some(cost_usd);
        self
    }

    pub fn kind(&self) -> StepKind {
        self.payload.kind()
    }

    /// One-line rendering for transcripts and step notifications.
    pub fn summary(&self) -> String {
        match &self.payload {
            StepPayload::Thinking { text } => format!("Thought: {text}"),
            StepPayload::ToolCall {
                tool_name,
                arguments,
                ..
            } => format!("Action: {tool_name}({arguments})"),
            StepPayload::ToolResult {
                success,
                result,
                error,
                ..
            } => {
                if *success {
                    let rendered = result
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "null".into());
                    format!("Observation: {rendered}")
                } else {
                    let rendered = error.as_deref().unwrap_or("unknown error");
                    format!("Observation: error: {rendered}")
                }
            }
            StepPayload::Synthesis { answer, .. } => format!("Answer: {answer}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        let correlation = CorrelationId::new();
        assert_eq!(ReasoningStep::thinking("hm").kind(), StepKind::Thinking);
        assert_eq!(
            ReasoningStep::tool_call("calc", "builtin", serde_json::json!({}), correlation.clone())
                .kind(),
            StepKind::ToolCall
        );
        assert_eq!(
            ReasoningStep::tool_result_ok(correlation.clone(), serde_json::json!(4)).kind(),
            StepKind::ToolResult
        );
        assert_eq!(
            ReasoningStep::synthesis("done", vec![0, 1]).kind(),
            StepKind::Synthesis
        );
    }

    #[test]
    fn step_serializes_with_inline_kind() {
        let step = ReasoningStep::thinking("considering options");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["kind"], "thinking");
        assert_eq!(json["text"], "considering options");
        assert_eq!(json["visibility"], "full");
    }

    #[test]
    fn tool_result_serialization_roundtrip() {
        let correlation = CorrelationId::from("corr-1");
        let step = ReasoningStep::tool_result_err(correlation, "boom")
            .with_visibility(Visibility::Summary);
        let json = serde_json::to_string(&step).unwrap();
        let back: ReasoningStep = serde_json::from_str(&json).unwrap();
        assert_eq!(back.kind(), StepKind::ToolResult);
        assert_eq!(back.visibility, Visibility::Summary);
        match back.payload {
            StepPayload::ToolResult {
                correlation_id,
                success,
                error,
                ..
            } => {
                assert_eq!(correlation_id.0, "corr-1");
                assert!(!success);
                assert_eq!(error.as_deref(), Some("boom"));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn usage_counters_attach() {
        let step = ReasoningStep::thinking("t").with_usage(42, 0.0021);
        assert_eq!(step.tokens, Some(42));
        assert_eq!(step.cost_usd, Some(0.0021));
    }

    #[test]
    fn summaries_render_per_kind() {
        let correlation = CorrelationId::new();
        let call = ReasoningStep::tool_call(
            "calculator",
            "builtin",
            serde_json::json!({"expression": "2+2"}),
            correlation.clone(),
        );
        assert!(call.summary().starts_with("Action: calculator"));

        let result = ReasoningStep::tool_result_ok(correlation, serde_json::json!({"value": 4}));
        assert!(result.summary().starts_with("Observation:"));
    }
}
