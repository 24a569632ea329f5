//! Pluggable execution backends for tool dispatch.
//!
//! The dispatcher hands a backend an activity envelope (name, timeout,
//! retry budget) plus a factory that produces one attempt's future. The
//! in-process backend drives attempts on the current runtime; a remote
//! backend could ship the same envelope to a worker fleet without the
//! reasoning loop noticing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use baton_core::{ToolError, ToolResult};

/// Execution envelope for one tool activity.
#[derive(Debug, Clone)]
pub struct ActivityOptions {
    /// Activity name, used in logs and timeout attribution.
    pub name: String,

    /// Per-attempt timeout. Zero disables the bound.
    pub timeout_ms: u64,

    /// Retries after the first failed attempt; total attempts are
    /// `max_retries + 1`.
    pub max_retries: u32,
}

impl ActivityOptions {
    pub fn new(name: impl Into<String>, timeout_ms: u64) -> Self {
        Self {
            name: name.into(),
            timeout_ms,
            max_retries: 0,
        }
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// One attempt of an activity.
pub type ActivityFuture = BoxFuture<'static, Result<ToolResult, ToolError>>;

/// Factory producing attempt futures; each retry gets a fresh one.
pub type ActivityFn = Arc<dyn Fn() -> ActivityFuture + Send + Sync>;

/// Where tool activities actually run.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Run one activity to completion, honoring the timeout and retry
    /// budget in `options`.
    async fn run_activity(
        &self,
        options: &ActivityOptions,
        work: ActivityFn,
    ) -> Result<ToolResult, ToolError>;
}

/// Runs activities on the current tokio runtime.
///
/// Each attempt is bounded by `tokio::time::timeout`. A timed-out or
/// erroring attempt is retried until the budget runs out, with no backoff
/// between attempts. A `ToolResult` with `success: false` is an outcome,
/// not an attempt failure, and passes through without retry.
#[derive(Debug, Default, Clone)]
pub struct InProcessBackend;

impl InProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutionBackend for InProcessBackend {
    fn name(&self) -> &str {
        "in_process"
    }

    async fn run_activity(
        &self,
        options: &ActivityOptions,
        work: ActivityFn,
    ) -> Result<ToolResult, ToolError> {
        let attempts = options.max_retries.saturating_add(1);
        let mut last_error =
            ToolError::Backend(format!("activity {} made no attempts", options.name));

        for attempt in 1..=attempts {
            let outcome = if options.timeout_ms == 0 {
                work().await
            } else {
                match tokio::time::timeout(Duration::from_millis(options.timeout_ms), work())
                    .await
                {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ToolError::Timeout {
                        tool_name: options.name.clone(),
                        timeout_ms: options.timeout_ms,
                    }),
                }
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if attempt < attempts {
                        debug!(
                            activity = %options.name,
                            attempt,
                            error = %err,
                            "activity attempt failed, retrying"
                        );
                    }
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }
}
