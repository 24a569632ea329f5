//! Visibility resolution and redaction for outbound events.
//!
//! Filtering happens on the consuming side: the producer emits everything it
//! records, and each consumer resolves event tags against its own configured
//! level. Redaction is a second, unconditional pass over human-readable text
//! so secrets never leave the process even at full visibility.

use baton_core::Visibility;
use regex_lite::Regex;

use crate::event::TaskEvent;

/// Whether an event tagged `event_visibility` may reach a consumer
/// configured at `viewer`.
///
/// Hidden events never pass. Summary events pass at summary or full. Full
/// events pass only at full.
pub fn passes(event_visibility: Visibility, viewer: Visibility) -> bool {
    match event_visibility {
        Visibility::Hidden => false,
        Visibility::Summary => matches!(viewer, Visibility::Summary | Visibility::Full),
        Visibility::Full => viewer == Visibility::Full,
    }
}

/// Blanks the values of sensitive-looking key/value substrings.
pub struct Redactor {
    pattern: Regex,
}

impl Redactor {
    pub fn new() -> Self {
        // Key names that mark the following value as sensitive. The value
        // match is greedy on purpose; over-redacting beats leaking.
        let pattern = Regex::new(
            r#"(?i)\b(password|passwd|pwd|secret|token|api[_-]?key|apikey|bearer|access[_-]?key)\b["']?\s*[:=]\s*["']?\S+"#,
        )
        .expect("redaction pattern is valid");
        Self { pattern }
    }

    /// Replace each sensitive pair with `key=[REDACTED]`.
    pub fn redact(&self, text: &str) -> String {
        self.pattern.replace_all(text, "${1}=[REDACTED]").into_owned()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-consumer event filter: visibility resolution plus redaction.
pub struct EventFilter {
    viewer: Visibility,
    redactor: Redactor,
}

impl EventFilter {
    pub fn new(viewer: Visibility) -> Self {
        Self {
            viewer,
            redactor: Redactor::new(),
        }
    }

    pub fn viewer(&self) -> Visibility {
        self.viewer
    }

    /// Resolve one event: `None` if the viewer may not see it, otherwise
    /// the event with its human-readable text redacted. Structural frames
    /// (status, clarification, error, done) always pass.
    pub fn apply(&self, event: TaskEvent) -> Option<TaskEvent> {
        if let Some(visibility) = event.visibility()
            && !passes(visibility, self.viewer)
        {
            return None;
        }

        Some(match event {
            TaskEvent::Step {
                task_id,
                seq,
                kind,
                summary,
                visibility,
            } => TaskEvent::Step {
                task_id,
                seq,
                kind,
                summary: self.redactor.redact(&summary),
                visibility,
            },
            TaskEvent::MessageChunk {
                task_id,
                content,
                last,
                visibility,
            } => TaskEvent::MessageChunk {
                task_id,
                content: self.redactor.redact(&content),
                last,
                visibility,
            },
            TaskEvent::Clarification { task_id, question } => TaskEvent::Clarification {
                task_id,
                question: self.redactor.redact(&question),
            },
            TaskEvent::Error {
                task_id,
                code,
                message,
            } => TaskEvent::Error {
                task_id,
                code,
                message: self.redactor.redact(&message),
            },
            other => other,
        })
    }
}
