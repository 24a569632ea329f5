//! Per-message routing between the default orchestrator and handoff targets.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use baton_core::ThreadId;

use crate::handoff::HandoffCoordinator;

/// Where one inbound message was sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Normal path: the thread's default orchestrator.
    Orchestrator { agent_id: String },

    /// Handoff path: the agent currently holding the thread.
    Handoff { agent_id: String },
}

impl RouteDecision {
    pub fn agent_id(&self) -> &str {
        match self {
            RouteDecision::Orchestrator { agent_id } | RouteDecision::Handoff { agent_id } => {
                agent_id
            }
        }
    }
}

/// Routes each inbound message on a thread.
///
/// The coordinator is consulted once per message and nothing is cached, so a
/// handoff return changes where the very next message goes.
pub struct StreamRouter {
    coordinator: Arc<HandoffCoordinator>,
    default_agent: String,
}

impl StreamRouter {
    pub fn new(coordinator: Arc<HandoffCoordinator>, default_agent: impl Into<String>) -> Self {
        Self {
            coordinator,
            default_agent: default_agent.into(),
        }
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    /// Decide where the next message on `thread_id` goes. Only an active
    /// handoff diverts; a merely pending request still routes normally.
    pub fn route_message(&self, thread_id: &ThreadId) -> RouteDecision {
        match self.coordinator.active_target(thread_id) {
            Some(agent_id) => {
                debug!(thread_id = %thread_id, target = %agent_id, "routing to handoff target");
                RouteDecision::Handoff { agent_id }
            }
            None => RouteDecision::Orchestrator {
                agent_id: self.default_agent.clone(),
            },
        }
    }
}
