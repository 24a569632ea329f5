//! The Baton reasoning engine.
//!
//! This crate turns a completion client and a tool registry into a running
//! agent: [`parser`] decodes the model's JSON decisions, [`dispatcher`] runs
//! tool calls through a pluggable [`backend`] and records them on the chain,
//! [`prompt`] renders the system and per-iteration prompts, and [`react`]
//! drives the loop and streams events.
//!
//! ```no_run
//! use std::sync::Arc;
//! use baton_core::{ExecutionContext, Task};
//! use baton_engine::ReactEngine;
//! use baton_tools::default_registry;
//!
//! # async fn example(client: Arc<dyn baton_core::CompletionClient>) -> baton_core::Result<()> {
//! let engine = ReactEngine::new(client, Arc::new(default_registry()));
//! let task = Task::new("orchestrator", "What is 2 + 3?");
//! let ctx = ExecutionContext::root(task.id.clone(), 2);
//! let report = engine.run(task, &ctx).await?;
//! println!("{:?}", report.verdict);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod dispatcher;
pub mod parser;
pub mod prompt;
pub mod react;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use backend::{ActivityFn, ActivityFuture, ActivityOptions, ExecutionBackend, InProcessBackend};
pub use dispatcher::ToolDispatcher;
pub use parser::{ParsedResponse, parse_model_response};
pub use prompt::{build_iteration_prompt, build_system_prompt};
pub use react::{ReactEngine, RunReport, RunVerdict};
