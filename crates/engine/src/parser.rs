//! Model response parsing: one strict JSON decision per completion.
//!
//! The model is instructed to reply with exactly one JSON object per turn,
//! either an action form or a final form. Real model output drifts anyway:
//! code fences, prose around the object, scalar `action_input`, missing
//! flags. This parser is total. It never returns an error; anything
//! undecodable comes back as a diagnostic thought so the loop can keep
//! going and spend budget on a retry instead of crashing the run.

use serde_json::Value;

/// The decision extracted from one model completion.
///
/// At most one of `final_answer`, `clarification_question`, and `action` is
/// populated, and `is_final` is true only when `final_answer` is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub thought: Option<String>,
    pub action: Option<String>,
    pub action_input: Option<Value>,
    pub final_answer: Option<String>,
    pub clarification_question: Option<String>,
    pub is_final: bool,
}

impl ParsedResponse {
    /// True when the completion produced no actionable decision.
    pub fn is_undecided(&self) -> bool {
        self.final_answer.is_none()
            && self.action.is_none()
            && self.clarification_question.is_none()
    }
}

/// Parse one raw completion into a decision.
///
/// Precedence when a response carries several decision fields at once:
/// final answer (requires a non-empty `final_answer` AND `is_final: true`),
/// then `clarification_question`, then `action`. A blank completion parses
/// to an empty response; a non-blank completion that cannot be decoded
/// parses to a diagnostic thought of the form `[Parse error: <kind>]`.
pub fn parse_model_response(raw: &str) -> ParsedResponse {
    if raw.trim().is_empty() {
        return ParsedResponse::default();
    }

    let cleaned = strip_code_fences(raw);
    let Some(span) = extract_json_span(cleaned) else {
        return diagnostic("no JSON object found");
    };
    let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(span) else {
        return diagnostic("invalid JSON");
    };

    let final_flag = fields
        .get("is_final")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let final_answer = non_empty_string(fields.get("final_answer"));
    let clarification = non_empty_string(fields.get("clarification_question"));
    let action = non_empty_string(fields.get("action"));

    let mut parsed = ParsedResponse {
        thought: non_empty_string(fields.get("thought")),
        ..ParsedResponse::default()
    };

    if final_flag && let Some(answer) = final_answer {
        parsed.final_answer = Some(answer);
        parsed.is_final = true;
    } else if let Some(question) = clarification {
        parsed.clarification_question = Some(question);
    } else if let Some(name) = action {
        parsed.action = Some(name);
        parsed.action_input = Some(normalize_action_input(fields.get("action_input")));
    }

    parsed
}

fn diagnostic(kind: &str) -> ParsedResponse {
    ParsedResponse {
        thought: Some(format!("[Parse error: {kind}]")),
        ..ParsedResponse::default()
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Strip a markdown code fence wrapper, tolerating an info string such as
/// `json` on the opening fence.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// The outermost `{ ... }` span of `text`, if any.
fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Normalize `action_input` to an object.
///
/// Objects pass through, arrays are wrapped as `{"items": [...]}`, scalars
/// as `{"value": ...}`, and a missing or null input becomes an empty
/// object. Argument validation downstream always sees an object.
fn normalize_action_input(value: Option<&Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::Object(serde_json::Map::new()),
        Some(Value::Object(map)) => Value::Object(map.clone()),
        Some(Value::Array(items)) => serde_json::json!({ "items": items }),
        Some(scalar) => serde_json::json!({ "value": scalar }),
    }
}
