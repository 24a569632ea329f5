//! Built-in tool implementations for Baton.
//!
//! Four tools cover the common ReAct needs: arithmetic, the current time,
//! structured lookup into JSON, and text measurement. `text_stats` returns a
//! truncatable `lines` field, so dispatcher-side result truncation has
//! something to exercise.

pub mod calculator;
pub mod clock;
pub mod json_query;
pub mod text_stats;

use std::sync::Arc;

use baton_core::ToolRegistry;

pub use calculator::CalculatorTool;
pub use clock::ClockTool;
pub use json_query::JsonQueryTool;
pub use text_stats::TextStatsTool;

/// A registry with every built-in tool registered.
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(CalculatorTool));
    registry.register(Arc::new(ClockTool));
    registry.register(Arc::new(JsonQueryTool));
    registry.register(Arc::new(TextStatsTool));
    registry
}
