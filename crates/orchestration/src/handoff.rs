//! The handoff protocol: moving control of a conversation thread from one
//! agent to another, with an explicit return path.
//!
//! Per-thread lifecycle: idle, requested, active, and back to idle when the
//! target returns the thread. A thread carries at most one in-flight handoff;
//! a second request while one is pending or active fails fast rather than
//! queueing. Free text on a request is sanitized before it crosses the
//! boundary.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use baton_core::{HandoffError, ThreadId};

use crate::sanitizer::ContextSanitizer;

// ── Protocol messages ─────────────────────────────────────────────────────

/// Asks another agent to take over a thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffRequest {
    pub thread_id: ThreadId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    pub source_agent: String,

    pub target_agent: String,

    /// What the target needs to know; sanitized before the request is filed.
    pub context_summary: String,

    pub reason: String,

    pub requested_at: DateTime<Utc>,
}

impl HandoffRequest {
    pub fn new(
        thread_id: ThreadId,
        source_agent: impl Into<String>,
        target_agent: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            thread_id,
            tenant_id: None,
            source_agent: source_agent.into(),
            target_agent: target_agent.into(),
            context_summary: String::new(),
            reason: reason.into(),
            requested_at: Utc::now(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.context_summary = summary.into();
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }
}

/// Confirms the target has taken the thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffAccept {
    pub thread_id: ThreadId,
    pub target_agent: String,
    pub accepted_at: DateTime<Utc>,
}

/// How the target's stewardship of a thread ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffOutcome {
    Completed,
    Cancelled,
    Error,
}

/// Gives a thread back to its orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandoffReturn {
    pub thread_id: ThreadId,

    pub target_agent: String,

    pub outcome: HandoffOutcome,

    /// References to artifacts produced while the target held the thread.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,

    pub returned_at: DateTime<Utc>,
}

impl HandoffReturn {
    pub fn new(thread_id: ThreadId, target_agent: impl Into<String>, outcome: HandoffOutcome) -> Self {
        Self {
            thread_id,
            target_agent: target_agent.into(),
            outcome,
            artifacts: Vec::new(),
            returned_at: Utc::now(),
        }
    }

    pub fn with_artifact(mut self, reference: impl Into<String>) -> Self {
        self.artifacts.push(reference.into());
        self
    }
}

// ── Coordinator ───────────────────────────────────────────────────────────

/// Where a thread currently stands in the protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffPhase {
    Idle,
    Requested { target_agent: String },
    Active { target_agent: String },
}

/// Tracks handoff state per thread.
///
/// Thread-safe. Every transition is a check-and-set under one write lock, so
/// two concurrent requests for the same thread cannot both win. Idle threads
/// hold no entry at all.
pub struct HandoffCoordinator {
    threads: RwLock<HashMap<ThreadId, HandoffPhase>>,
    sanitizer: ContextSanitizer,
}

impl HandoffCoordinator {
    pub fn new() -> Self {
        Self {
            threads: RwLock::new(HashMap::new()),
            sanitizer: ContextSanitizer::new(),
        }
    }

    /// File a handoff request for a thread. Returns the request as actually
    /// forwarded, with its boundary text sanitized. Fails while any other
    /// handoff is pending or active on the thread.
    pub fn request(&self, mut request: HandoffRequest) -> Result<HandoffRequest, HandoffError> {
        let mut threads = self.threads.write().unwrap();
        if threads.contains_key(&request.thread_id) {
            return Err(HandoffError::AlreadyInProgress {
                thread_id: request.thread_id.0.clone(),
            });
        }

        request.context_summary = self.sanitizer.sanitize(&request.context_summary);
        request.reason = self.sanitizer.sanitize(&request.reason);
        threads.insert(
            request.thread_id.clone(),
            HandoffPhase::Requested {
                target_agent: request.target_agent.clone(),
            },
        );

        info!(
            thread_id = %request.thread_id,
            source = %request.source_agent,
            target = %request.target_agent,
            "handoff requested"
        );
        Ok(request)
    }

    /// Accept the pending request on a thread, activating the handoff.
    pub fn accept(&self, thread_id: &ThreadId) -> Result<HandoffAccept, HandoffError> {
        let mut threads = self.threads.write().unwrap();
        let target_agent = match threads.get(thread_id) {
            Some(HandoffPhase::Requested { target_agent }) => target_agent.clone(),
            _ => {
                return Err(HandoffError::NoPendingRequest {
                    thread_id: thread_id.0.clone(),
                });
            }
        };

        threads.insert(
            thread_id.clone(),
            HandoffPhase::Active {
                target_agent: target_agent.clone(),
            },
        );

        info!(thread_id = %thread_id, target = %target_agent, "handoff accepted");
        Ok(HandoffAccept {
            thread_id: thread_id.clone(),
            target_agent,
            accepted_at: Utc::now(),
        })
    }

    /// Decline the pending request; the thread goes back to normal routing.
    pub fn reject(&self, thread_id: &ThreadId) -> Result<(), HandoffError> {
        let mut threads = self.threads.write().unwrap();
        match threads.get(thread_id) {
            Some(HandoffPhase::Requested { .. }) => {
                threads.remove(thread_id);
                info!(thread_id = %thread_id, "handoff rejected");
                Ok(())
            }
            _ => Err(HandoffError::NoPendingRequest {
                thread_id: thread_id.0.clone(),
            }),
        }
    }

    /// Close the active handoff with the target's return message. Any
    /// outcome, including `Error`, restores normal routing.
    pub fn complete(&self, handoff_return: &HandoffReturn) -> Result<(), HandoffError> {
        let mut threads = self.threads.write().unwrap();
        match threads.get(&handoff_return.thread_id) {
            Some(HandoffPhase::Active { .. }) => {
                threads.remove(&handoff_return.thread_id);
                info!(
                    thread_id = %handoff_return.thread_id,
                    outcome = ?handoff_return.outcome,
                    artifacts = handoff_return.artifacts.len(),
                    "handoff returned"
                );
                Ok(())
            }
            _ => Err(HandoffError::NoActiveHandoff {
                thread_id: handoff_return.thread_id.0.clone(),
            }),
        }
    }

    /// The agent currently holding the thread, if a handoff is active.
    pub fn active_target(&self, thread_id: &ThreadId) -> Option<String> {
        match self.threads.read().unwrap().get(thread_id) {
            Some(HandoffPhase::Active { target_agent }) => Some(target_agent.clone()),
            _ => None,
        }
    }

    /// Protocol phase for a thread; unknown threads are idle.
    pub fn phase(&self, thread_id: &ThreadId) -> HandoffPhase {
        self.threads
            .read()
            .unwrap()
            .get(thread_id)
            .cloned()
            .unwrap_or(HandoffPhase::Idle)
    }
}

impl Default for HandoffCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
