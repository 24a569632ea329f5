//! Tool trait and registry, the abstraction over agent capabilities.
//!
//! A tool declares its interface as an ordered parameter list; arguments are
//! validated against that declaration before execution, so every tool gets
//! argument-level error detail without writing its own checks. Tools are
//! registered in a [`ToolRegistry`] that is passed explicitly to whoever
//! dispatches them; there is no global registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::chain::ChainId;
use crate::error::ToolError;
use crate::step::CorrelationId;
use crate::task::TaskId;

/// Default per-call timeout when a definition does not override it.
pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 30_000;

// ── Definitions ───────────────────────────────────────────────────────────

/// JSON value type accepted by a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    /// Whether `value` conforms to this type. `Number` accepts integers too.
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Number => value.is_number(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        };
        write!(f, "{s}")
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    pub description: String,
}

impl ToolParameter {
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
            description: description.into(),
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        default: serde_json::Value,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: Some(default),
            description: description.into(),
        }
    }
}

/// The declared interface of a tool: name, type tag, description, ordered
/// parameters, and per-call timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub tool_type: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub timeout_ms: u64,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tool_type: "function".into(),
            description: description.into(),
            parameters: Vec::new(),
            timeout_ms: DEFAULT_TOOL_TIMEOUT_MS,
        }
    }

    pub fn with_type(mut self, tool_type: impl Into<String>) -> Self {
        self.tool_type = tool_type.into();
        self
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

// ── Validation ────────────────────────────────────────────────────────────

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Validate `arguments` against a definition. On success returns the
/// normalized argument object with declared defaults filled in. All problems
/// are collected into one message so the model sees every mistake at once.
pub fn validate_arguments(
    definition: &ToolDefinition,
    arguments: &serde_json::Value,
) -> std::result::Result<serde_json::Value, ToolError> {
    let supplied = match arguments {
        serde_json::Value::Object(map) => map.clone(),
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            return Err(ToolError::InvalidArguments(format!(
                "arguments must be a JSON object, got {}",
                json_type_name(other)
            )));
        }
    };

    let mut problems = Vec::new();
    let mut normalized = serde_json::Map::new();

    for key in supplied.keys() {
        if !definition.parameters.iter().any(|p| p.name == *key) {
            problems.push(format!("unknown argument '{key}'"));
        }
    }

    for parameter in &definition.parameters {
        match supplied.get(&parameter.name) {
            Some(value) => {
                if parameter.param_type.matches(value) {
                    normalized.insert(parameter.name.clone(), value.clone());
                } else {
                    problems.push(format!(
                        "argument '{}': expected {}, got {}",
                        parameter.name,
                        parameter.param_type,
                        json_type_name(value)
                    ));
                }
            }
            None => {
                if let Some(default) = &parameter.default {
                    normalized.insert(parameter.name.clone(), default.clone());
                } else if parameter.required {
                    problems.push(format!("missing required argument '{}'", parameter.name));
                }
            }
        }
    }

    if problems.is_empty() {
        Ok(serde_json::Value::Object(normalized))
    } else {
        Err(ToolError::InvalidArguments(problems.join("; ")))
    }
}

// ── Results ───────────────────────────────────────────────────────────────

/// The typed outcome of one tool call.
///
/// `duration_ms` is stamped by the dispatcher with measured wall time; tool
/// implementations leave it at 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Whether the tool executed successfully
    pub success: bool,

    /// Structured result payload (on success)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    /// Error message (on failure)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Machine-readable failure code (on failure), e.g. `tool_not_found`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,

    /// Wall time of the call
    pub duration_ms: u64,

    /// Result fields whose list payloads may be shortened for
    /// context-window economy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub truncatable_fields: Vec<String>,

    /// Record of any truncation applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation_note: Option<String>,
}

impl ToolResult {
    /// A successful result with a structured payload.
    pub fn ok(result: serde_json::Value) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            error_code: None,
            duration_ms: 0,
            truncatable_fields: Vec::new(),
            truncation_note: None,
        }
    }

    /// A failed result with an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
            error_code: None,
            duration_ms: 0,
            truncatable_fields: Vec::new(),
            truncation_note: None,
        }
    }

    /// Attach a machine-readable failure code.
    pub fn with_error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Name result fields whose list payloads tolerate shortening.
    pub fn with_truncatable(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.truncatable_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Shorten the named truncatable fields' list payloads to at most
    /// `max_items` each. Scalar fields (counts, flags) are left intact, so a
    /// consumer still sees the full totals next to the shortened lists. A
    /// note records what was cut.
    pub fn truncate_for_context(&mut self, max_items: usize) {
        let Some(serde_json::Value::Object(map)) = self.result.as_mut() else {
            return;
        };

        let mut notes = Vec::new();
        for field in &self.truncatable_fields {
            if let Some(serde_json::Value::Array(items)) = map.get_mut(field)
                && items.len() > max_items
            {
                let original = items.len();
                items.truncate(max_items);
                notes.push(format!(
                    "field '{field}' truncated from {original} to {max_items} items"
                ));
            }
        }

        if !notes.is_empty() {
            self.truncation_note = Some(notes.join("; "));
        }
    }
}

// ── Call context ──────────────────────────────────────────────────────────

/// Explicit per-call context threaded through the dispatch boundary.
///
/// Carries the correlation id that ties a tool_call step to its tool_result
/// step, plus the identifiers a backend or an audit trail needs. Always
/// passed as a value; never ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallContext {
    pub correlation_id: CorrelationId,
    pub task_id: TaskId,
    pub agent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<ChainId>,
}

impl ToolCallContext {
    /// New context with a fresh correlation id.
    pub fn new(task_id: TaskId, agent_id: impl Into<String>) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            task_id,
            agent_id: agent_id.into(),
            tenant_id: None,
            trace_id: None,
            chain_id: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn with_trace(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_chain(mut self, chain_id: ChainId) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

// ── The Tool trait ────────────────────────────────────────────────────────

/// The closed capability interface every tool implements.
///
/// Concrete tools live in their own crate and are registered by name. The
/// default `validate` checks arguments against the declared parameter list;
/// tools with richer constraints can override it.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The declared interface of this tool.
    fn definition(&self) -> ToolDefinition;

    /// Validate arguments, returning the normalized object with defaults
    /// filled in.
    fn validate(
        &self,
        arguments: &serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError> {
        validate_arguments(&self.definition(), arguments)
    }

    /// Run the tool. `arguments` have already passed `validate`.
    async fn execute(
        &self,
        ctx: &ToolCallContext,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError>;
}

// ── Registry ──────────────────────────────────────────────────────────────

/// A name-keyed registry of tools.
///
/// Built mutably at startup, then frozen behind an `Arc` and shared;
/// lookups after that point are read-only and safe across tasks.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool under its declared name. Replaces any existing tool
    /// with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name;
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All tool definitions, sorted by name so catalogs render stably.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// All registered tool names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
