//! # Baton Core
//!
//! Domain types, traits, and error definitions for the Baton agent task
//! runtime. This crate carries no runtime or framework dependencies: it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem seam is defined as a trait here (tools, the completion
//! capability). Implementations live in their respective crates. State that
//! needs sharing is constructed explicitly and threaded through call sites;
//! there are no process-wide singletons.

pub mod chain;
pub mod completion;
pub mod context;
pub mod error;
pub mod step;
pub mod task;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use chain::{ChainId, ChainMetrics, ChainStatus, ReasoningChain};
pub use completion::{Completion, CompletionClient, Usage};
pub use context::ExecutionContext;
pub use error::{
    CompletionError, ContextError, Error, HandoffError, Result, StreamError, ToolError,
};
pub use step::{CorrelationId, ReasoningStep, StepKind, StepPayload, Visibility};
pub use task::{Message, Role, Task, TaskId, TaskState, ThreadId};
pub use tool::{
    DEFAULT_TOOL_TIMEOUT_MS, ParamType, Tool, ToolCallContext, ToolDefinition, ToolParameter,
    ToolRegistry, ToolResult, validate_arguments,
};
