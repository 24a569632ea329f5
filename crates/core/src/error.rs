//! Error types for the Baton domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Recoverable conditions (malformed model output, tool failures, budget
//! exhaustion) are reported as values, not errors; the enums here cover the
//! remaining failure modes and the contract violations that must fail fast.

use thiserror::Error;

/// The top-level error type for all Baton operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Completion errors ---
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Execution context errors ---
    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    // --- Event stream errors ---
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    // --- Handoff errors ---
    #[error("Handoff error: {0}")]
    Handoff(#[from] HandoffError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the opaque `complete(prompt) -> text` capability.
#[derive(Debug, Clone, Error)]
pub enum CompletionError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Completion timed out: {0}")]
    Timeout(String),

    #[error("Completion client not configured: {0}")]
    NotConfigured(String),
}

#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_ms}ms")]
    Timeout { tool_name: String, timeout_ms: u64 },

    #[error("Execution backend failure: {0}")]
    Backend(String),
}

impl ToolError {
    /// Stable machine-readable code for event consumers.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::NotFound(_) => "tool_not_found",
            ToolError::InvalidArguments(_) => "tool_invalid_arguments",
            ToolError::ExecutionFailed { .. } => "tool_execution_failed",
            ToolError::Timeout { .. } => "tool_timeout",
            ToolError::Backend(_) => "backend_failure",
        }
    }
}

/// Contract violations around sub-agent spawning. These indicate a caller
/// bug and always propagate.
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    #[error("Spawn depth exceeded: depth {depth} with max_depth {max_depth}")]
    DepthExceeded { depth: u32, max_depth: u32 },
}

#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// A done frame must carry a terminal task state. Violation is a caller
    /// bug and fails fast.
    #[error("Done event carries non-terminal state: {state}")]
    NonTerminalDone { state: String },

    #[error("Stream already closed by a terminal frame")]
    AlreadyTerminated,

    /// The consumer dropped its receiver. Producers treat this as a
    /// cooperative cancellation signal, not a fault.
    #[error("Stream consumer disconnected")]
    Disconnected,
}

#[derive(Debug, Clone, Error)]
pub enum HandoffError {
    /// A thread allows at most one in-flight handoff. A second request while
    /// one is pending or active fails fast.
    #[error("Handoff already in progress for thread {thread_id}")]
    AlreadyInProgress { thread_id: String },

    #[error("No pending handoff request for thread {thread_id}")]
    NoPendingRequest { thread_id: String },

    #[error("No active handoff for thread {thread_id}")]
    NoActiveHandoff { thread_id: String },
}
