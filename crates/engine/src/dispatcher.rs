//! Tool dispatch: lookup, validation, ledger pairing, backend invocation.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use baton_core::{
    ReasoningChain, ReasoningStep, Tool, ToolCallContext, ToolError, ToolRegistry, ToolResult,
};

use crate::backend::{ActivityFn, ActivityOptions, ExecutionBackend, InProcessBackend};

/// Dispatches tool calls on behalf of the reasoning loop.
///
/// Dispatch is infallible from the loop's point of view: lookup misses,
/// argument rejections, timeouts, and execution failures all come back as a
/// failed [`ToolResult`] carrying a machine-readable `error_code`. Every
/// dispatch appends a tool_call step and its paired tool_result step onto
/// the chain, whichever way the call went, so the ledger always reads as
/// call followed by outcome.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    backend: Arc<dyn ExecutionBackend>,
    max_retries: u32,
    timeout_override: Option<u64>,
    truncate_items: Option<usize>,
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>, backend: Arc<dyn ExecutionBackend>) -> Self {
        Self {
            registry,
            backend,
            max_retries: 0,
            timeout_override: None,
            truncate_items: None,
        }
    }

    /// Dispatcher over the in-process backend.
    pub fn in_process(registry: Arc<ToolRegistry>) -> Self {
        Self::new(registry, Arc::new(InProcessBackend::new()))
    }

    /// Retry budget applied to every call.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Bound every attempt at `timeout_ms` instead of each tool's own
    /// definition timeout. Zero disables the bound entirely.
    pub fn with_timeout_override(mut self, timeout_ms: u64) -> Self {
        self.timeout_override = Some(timeout_ms);
        self
    }

    /// Shorten truncatable list fields of results to at most `max_items`
    /// before they enter the ledger.
    pub fn with_truncation(mut self, max_items: usize) -> Self {
        self.truncate_items = Some(max_items);
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Execute one tool call, recording the paired steps on `chain`.
    ///
    /// `arguments` is the raw input named by the model; validation and
    /// default-filling happen here. The returned result carries measured
    /// wall time.
    pub async fn execute(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
        call_ctx: &ToolCallContext,
        chain: &mut ReasoningChain,
    ) -> ToolResult {
        let started = Instant::now();

        let Some(tool) = self.registry.get(tool_name) else {
            let err = ToolError::NotFound(tool_name.to_string());
            return self.record_rejection(chain, call_ctx, tool_name, "unknown", arguments, err, started);
        };
        let definition = tool.definition();

        let normalized = match tool.validate(&arguments) {
            Ok(normalized) => normalized,
            Err(err) => {
                return self.record_rejection(
                    chain,
                    call_ctx,
                    tool_name,
                    &definition.tool_type,
                    arguments,
                    err,
                    started,
                );
            }
        };

        chain.append_step(ReasoningStep::tool_call(
            tool_name,
            &definition.tool_type,
            normalized.clone(),
            call_ctx.correlation_id.clone(),
        ));

        let timeout_ms = self.timeout_override.unwrap_or(definition.timeout_ms);
        let options = ActivityOptions::new(tool_name, timeout_ms).with_retries(self.max_retries);
        let work = make_activity(tool, call_ctx.clone(), normalized);
        let outcome = self.backend.run_activity(&options, work).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(mut result) => {
                result.duration_ms = duration_ms;
                if !result.success && result.error_code.is_none() {
                    result.error_code = Some("tool_execution_failed".into());
                }
                if let Some(max_items) = self.truncate_items {
                    result.truncate_for_context(max_items);
                }
                let step = if result.success {
                    ReasoningStep::tool_result_ok(
                        call_ctx.correlation_id.clone(),
                        result.result.clone().unwrap_or(serde_json::Value::Null),
                    )
                } else {
                    ReasoningStep::tool_result_err(
                        call_ctx.correlation_id.clone(),
                        result.error.clone().unwrap_or_else(|| "tool failed".into()),
                    )
                };
                chain.append_step(step);
                debug!(
                    tool = tool_name,
                    success = result.success,
                    duration_ms,
                    "tool call finished"
                );
                result
            }
            Err(err) => {
                warn!(tool = tool_name, error = %err, "tool call failed");
                chain.append_step(ReasoningStep::tool_result_err(
                    call_ctx.correlation_id.clone(),
                    err.to_string(),
                ));
                let mut result = ToolResult::failed(err.to_string()).with_error_code(err.code());
                result.duration_ms = duration_ms;
                result
            }
        }
    }

    /// Record a dispatch rejected before the backend ran. The call step and
    /// its failed result still land on the chain as a normal pair.
    #[allow(clippy::too_many_arguments)]
    fn record_rejection(
        &self,
        chain: &mut ReasoningChain,
        call_ctx: &ToolCallContext,
        tool_name: &str,
        tool_type: &str,
        arguments: serde_json::Value,
        err: ToolError,
        started: Instant,
    ) -> ToolResult {
        warn!(tool = tool_name, error = %err, "tool dispatch rejected");
        chain.append_step(ReasoningStep::tool_call(
            tool_name,
            tool_type,
            arguments,
            call_ctx.correlation_id.clone(),
        ));
        chain.append_step(ReasoningStep::tool_result_err(
            call_ctx.correlation_id.clone(),
            err.to_string(),
        ));
        let mut result = ToolResult::failed(err.to_string()).with_error_code(err.code());
        result.duration_ms = started.elapsed().as_millis() as u64;
        result
    }
}

/// Wrap a tool call as a retryable activity. The factory owns its inputs so
/// every attempt future is `'static`.
fn make_activity(
    tool: Arc<dyn Tool>,
    call_ctx: ToolCallContext,
    arguments: serde_json::Value,
) -> ActivityFn {
    Arc::new(move || {
        let tool = tool.clone();
        let ctx = call_ctx.clone();
        let arguments = arguments.clone();
        Box::pin(async move { tool.execute(&ctx, arguments).await })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use baton_core::{
        ParamType, StepKind, StepPayload, TaskId, ToolDefinition, ToolParameter,
    };
    use std::time::Duration;

    struct AddTool;

    #[async_trait]
    impl Tool for AddTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("add", "Adds two integers")
                .with_parameter(ToolParameter::required("a", ParamType::Integer, "Left operand"))
                .with_parameter(ToolParameter::required("b", ParamType::Integer, "Right operand"))
        }

        async fn execute(
            &self,
            _ctx: &ToolCallContext,
            arguments: serde_json::Value,
        ) -> Result<ToolResult, ToolError> {
            let a = arguments["a"].as_i64().unwrap_or(0);
            let b = arguments["b"].as_i64().unwrap_or(0);
            Ok(ToolResult::ok(serde_json::json!({ "sum": a + b })))
        }
    }

    struct SleepyTool;

    #[async_trait]
    impl Tool for SleepyTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("sleepy", "Never finishes in time").with_timeout_ms(20)
        }

        async fn execute(
            &self,
            _ctx: &ToolCallContext,
            _arguments: serde_json::Value,
        ) -> Result<ToolResult, ToolError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(ToolResult::ok(serde_json::Value::Null))
        }
    }

    struct ListyTool;

    #[async_trait]
    impl Tool for ListyTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("listy", "Returns a long list")
        }

        async fn execute(
            &self,
            _ctx: &ToolCallContext,
            _arguments: serde_json::Value,
        ) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(serde_json::json!({
                "count": 5,
                "entries": ["a", "b", "c", "d", "e"],
            }))
            .with_truncatable(["entries"]))
        }
    }

    struct PauseTool;

    #[async_trait]
    impl Tool for PauseTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new("pause", "Sleeps briefly")
        }

        async fn execute(
            &self,
            _ctx: &ToolCallContext,
            _arguments: serde_json::Value,
        ) -> Result<ToolResult, ToolError> {
            tokio::time::sleep(Duration::from_millis(15)).await;
            Ok(ToolResult::ok(serde_json::Value::Null))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(AddTool));
        registry.register(Arc::new(SleepyTool));
        registry.register(Arc::new(ListyTool));
        registry.register(Arc::new(PauseTool));
        Arc::new(registry)
    }

    fn chain_and_ctx() -> (ReasoningChain, ToolCallContext) {
        let task_id = TaskId::new();
        let chain = ReasoningChain::new(task_id.clone(), "tester");
        let ctx = ToolCallContext::new(task_id, "tester");
        (chain, ctx)
    }

    fn kinds(chain: &ReasoningChain) -> Vec<StepKind> {
        chain.steps().iter().map(|s| s.kind()).collect()
    }

    #[tokio::test]
    async fn successful_call_appends_a_matched_pair() {
        let dispatcher = ToolDispatcher::in_process(registry());
        let (mut chain, ctx) = chain_and_ctx();

        let result = dispatcher
            .execute("add", serde_json::json!({"a": 2, "b": 3}), &ctx, &mut chain)
            .await;

        assert!(result.success);
        assert_eq!(result.result.as_ref().unwrap()["sum"], 5);
        assert_eq!(kinds(&chain), vec![StepKind::ToolCall, StepKind::ToolResult]);

        let call_corr = match &chain.steps()[0].payload {
            StepPayload::ToolCall { correlation_id, .. } => correlation_id.clone(),
            other => panic!("expected tool_call, got {other:?}"),
        };
        let result_corr = match &chain.steps()[1].payload {
            StepPayload::ToolResult { correlation_id, .. } => correlation_id.clone(),
            other => panic!("expected tool_result, got {other:?}"),
        };
        assert_eq!(call_corr, result_corr);
        assert_eq!(call_corr, ctx.correlation_id);
    }

    #[tokio::test]
    async fn unknown_tool_records_pair_and_fails_with_code() {
        let dispatcher = ToolDispatcher::in_process(registry());
        let (mut chain, ctx) = chain_and_ctx();

        let result = dispatcher
            .execute("bogus", serde_json::json!({}), &ctx, &mut chain)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("tool_not_found"));
        assert!(result.error.unwrap().contains("bogus"));
        assert_eq!(kinds(&chain), vec![StepKind::ToolCall, StepKind::ToolResult]);
        assert_eq!(chain.metrics.tool_calls, 1);
    }

    #[tokio::test]
    async fn invalid_arguments_record_pair_with_raw_input() {
        let dispatcher = ToolDispatcher::in_process(registry());
        let (mut chain, ctx) = chain_and_ctx();

        let result = dispatcher
            .execute("add", serde_json::json!({"a": "two"}), &ctx, &mut chain)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("tool_invalid_arguments"));
        let message = result.error.unwrap();
        assert!(message.contains("expected integer"));
        assert!(message.contains("missing required argument 'b'"));

        match &chain.steps()[0].payload {
            StepPayload::ToolCall { arguments, .. } => {
                assert_eq!(arguments, &serde_json::json!({"a": "two"}));
            }
            other => panic!("expected tool_call, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn definition_timeout_maps_to_tool_timeout() {
        let dispatcher = ToolDispatcher::in_process(registry());
        let (mut chain, ctx) = chain_and_ctx();

        let result = dispatcher
            .execute("sleepy", serde_json::json!({}), &ctx, &mut chain)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("tool_timeout"));
        assert!(result.error.unwrap().contains("after 20ms"));
        assert_eq!(kinds(&chain), vec![StepKind::ToolCall, StepKind::ToolResult]);
    }

    #[tokio::test]
    async fn timeout_override_replaces_definition_timeouts() {
        let dispatcher = ToolDispatcher::in_process(registry()).with_timeout_override(5);
        let (mut chain, ctx) = chain_and_ctx();

        let result = dispatcher
            .execute("pause", serde_json::json!({}), &ctx, &mut chain)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("tool_timeout"));
        assert!(result.error.unwrap().contains("after 5ms"));
    }

    #[tokio::test]
    async fn truncation_applies_before_the_ledger() {
        let dispatcher = ToolDispatcher::in_process(registry()).with_truncation(2);
        let (mut chain, ctx) = chain_and_ctx();

        let result = dispatcher
            .execute("listy", serde_json::json!({}), &ctx, &mut chain)
            .await;

        assert!(result.success);
        assert!(result.truncation_note.unwrap().contains("'entries'"));

        match &chain.steps()[1].payload {
            StepPayload::ToolResult { result: Some(payload), .. } => {
                assert_eq!(payload["entries"].as_array().unwrap().len(), 2);
                assert_eq!(payload["count"], 5);
            }
            other => panic!("expected successful tool_result, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duration_is_stamped_by_the_dispatcher() {
        let dispatcher = ToolDispatcher::in_process(registry());
        let (mut chain, ctx) = chain_and_ctx();

        let result = dispatcher
            .execute("pause", serde_json::json!({}), &ctx, &mut chain)
            .await;

        // Tools leave duration at 0; the measured wall time covers the sleep.
        assert!(result.duration_ms >= 10, "got {}ms", result.duration_ms);
    }
}
