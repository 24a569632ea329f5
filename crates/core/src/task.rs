//! Task and Message domain types.
//!
//! A task is the unit of work the engine owns for the duration of one run:
//! caller submits a prompt → engine works the ReAct loop → task reaches a
//! terminal state. Messages carry the conversational history on the task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a conversation thread (the unit of handoff routing).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ThreadId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a task.
///
/// Transitions: `Submitted → Working → {Completed, Failed, Cancelled}`.
/// Terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Submitted,
    Working,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Submitted => "submitted",
            TaskState::Working => "working",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

/// The role of a message sender on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The solving agent
    Assistant,
    /// System instructions
    System,
}

/// A single message on a task.
///
/// Tool activity is not modelled as messages; it lives in the reasoning
/// chain, keyed by correlation ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Timestamp
    pub timestamp: DateTime<Utc>,

    /// Optional metadata (channel info, routing info, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::System,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: serde_json::Map::new(),
        }
    }
}

/// A unit of work owned by an agent for the duration of one engine run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: TaskId,

    /// The agent responsible for this task
    pub agent_id: String,

    /// Ordered messages
    pub messages: Vec<Message>,

    /// Lifecycle state
    pub state: TaskState,

    /// When this task was created
    pub created_at: DateTime<Utc>,

    /// When the task last changed
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a freshly submitted task with the user's opening prompt.
    pub fn new(agent_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            agent_id: agent_id.into(),
            messages: vec![Message::user(prompt)],
            state: TaskState::Submitted,
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a message to the task.
    pub fn push_message(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// The user's opening prompt, if any.
    pub fn prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Transition the lifecycle state. Terminal states are immutable: a
    /// transition attempt on a finished task is ignored.
    pub fn set_state(&mut self, state: TaskState) {
        if self.state.is_terminal() {
            tracing::debug!(
                task_id = %self.id,
                current = %self.state,
                requested = %state,
                "ignoring state transition on terminal task"
            );
            return;
        }
        self.state = state;
        self.updated_at = Utc::now();
    }
}
