//! Task-level streaming events.
//!
//! `TaskEvent` frames carry engine activity to external consumers in strict
//! emission order. Frames either describe observable work (steps, message
//! chunks, artifacts) and carry a visibility tag, or are structural (status,
//! clarification, error, done) and always reach the consumer.

use baton_core::{StepKind, TaskId, TaskState, Visibility};
use serde::{Deserialize, Serialize};

/// Events emitted while a task runs.
///
/// Exactly one `done` frame closes a completed stream, always carrying a
/// terminal task state. Clarification streams close without `done`; the task
/// is still open.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// Lifecycle transition of the task.
    Status { task_id: TaskId, state: TaskState },

    /// A reasoning step was appended to the chain.
    Step {
        task_id: TaskId,
        seq: u64,
        kind: StepKind,
        summary: String,
        visibility: Visibility,
    },

    /// Partial or completing answer text.
    MessageChunk {
        task_id: TaskId,
        content: String,
        last: bool,
        visibility: Visibility,
    },

    /// A produced artifact (e.g. the final answer payload).
    Artifact {
        task_id: TaskId,
        name: String,
        payload: serde_json::Value,
        visibility: Visibility,
    },

    /// The run stopped to ask the user a question.
    Clarification { task_id: TaskId, question: String },

    /// A reported failure (tool failure, exhaustion); machine-readable code
    /// plus human message.
    Error {
        task_id: TaskId,
        code: String,
        message: String,
    },

    /// Terminal frame; `state` is always terminal.
    Done {
        task_id: TaskId,
        state: TaskState,
        iterations: u32,
        total_steps: u64,
    },
}

impl TaskEvent {
    /// Wire name for this event kind.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Step { .. } => "step",
            Self::MessageChunk { .. } => "message_chunk",
            Self::Artifact { .. } => "artifact",
            Self::Clarification { .. } => "clarification",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }

    /// Visibility tag, or `None` for structural frames that always pass the
    /// filter.
    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            Self::Step { visibility, .. }
            | Self::MessageChunk { visibility, .. }
            | Self::Artifact { visibility, .. } => Some(*visibility),
            Self::Status { .. }
            | Self::Clarification { .. }
            | Self::Error { .. }
            | Self::Done { .. } => None,
        }
    }

    /// Whether this frame terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    pub fn task_id(&self) -> &TaskId {
        match self {
            Self::Status { task_id, .. }
            | Self::Step { task_id, .. }
            | Self::MessageChunk { task_id, .. }
            | Self::Artifact { task_id, .. }
            | Self::Clarification { task_id, .. }
            | Self::Error { task_id, .. }
            | Self::Done { task_id, .. } => task_id,
        }
    }
}
