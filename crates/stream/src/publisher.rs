//! The producing side of a task event stream.
//!
//! A `TaskPublisher` writes [`TaskEvent`] frames into a bounded channel. It
//! enforces the terminal contract: a `done` frame must carry a terminal task
//! state, and nothing may follow it. A send against a dropped receiver
//! surfaces as [`StreamError::Disconnected`], which producers treat as the
//! cooperative cancellation signal.

use baton_core::{ReasoningStep, StreamError, TaskId, TaskState, Visibility};
use tokio::sync::mpsc;

use crate::event::TaskEvent;

/// Default bound of the event channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 128;

/// Producer handle for one task's event stream.
pub struct TaskPublisher {
    task_id: TaskId,
    tx: mpsc::Sender<TaskEvent>,
    terminated: bool,
}

impl TaskPublisher {
    /// Create a publisher and the receiver its consumer will drain.
    pub fn channel(task_id: TaskId, capacity: usize) -> (Self, mpsc::Receiver<TaskEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                task_id,
                tx,
                terminated: false,
            },
            rx,
        )
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Send one frame, enforcing the terminal contract.
    ///
    /// A `Done` frame with a non-terminal state is a caller bug and fails
    /// fast. Any frame after a `Done` fails with `AlreadyTerminated`.
    pub async fn send(&mut self, event: TaskEvent) -> Result<(), StreamError> {
        if self.terminated {
            return Err(StreamError::AlreadyTerminated);
        }
        if let TaskEvent::Done { state, .. } = &event
            && !state.is_terminal()
        {
            return Err(StreamError::NonTerminalDone {
                state: state.to_string(),
            });
        }

        let is_done = event.is_terminal();
        self.tx.send(event).await.map_err(|_| {
            tracing::debug!(task_id = %self.task_id, "event consumer disconnected");
            StreamError::Disconnected
        })?;
        if is_done {
            self.terminated = true;
        }
        Ok(())
    }

    // ── Convenience emitters ──

    pub async fn status(&mut self, state: TaskState) -> Result<(), StreamError> {
        let task_id = self.task_id.clone();
        self.send(TaskEvent::Status { task_id, state }).await
    }

    /// Notify a freshly appended step. Summary text is the step's one-line
    /// rendering; the visibility tag travels with the frame.
    pub async fn step(&mut self, step: &ReasoningStep) -> Result<(), StreamError> {
        let task_id = self.task_id.clone();
        self.send(TaskEvent::Step {
            task_id,
            seq: step.seq,
            kind: step.kind(),
            summary: step.summary(),
            visibility: step.visibility,
        })
        .await
    }

    pub async fn chunk(
        &mut self,
        content: impl Into<String>,
        last: bool,
        visibility: Visibility,
    ) -> Result<(), StreamError> {
        let task_id = self.task_id.clone();
        self.send(TaskEvent::MessageChunk {
            task_id,
            content: content.into(),
            last,
            visibility,
        })
        .await
    }

    pub async fn artifact(
        &mut self,
        name: impl Into<String>,
        payload: serde_json::Value,
        visibility: Visibility,
    ) -> Result<(), StreamError> {
        let task_id = self.task_id.clone();
        self.send(TaskEvent::Artifact {
            task_id,
            name: name.into(),
            payload,
            visibility,
        })
        .await
    }

    pub async fn clarification(
        &mut self,
        question: impl Into<String>,
    ) -> Result<(), StreamError> {
        let task_id = self.task_id.clone();
        self.send(TaskEvent::Clarification {
            task_id,
            question: question.into(),
        })
        .await
    }

    pub async fn error(
        &mut self,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), StreamError> {
        let task_id = self.task_id.clone();
        self.send(TaskEvent::Error {
            task_id,
            code: code.into(),
            message: message.into(),
        })
        .await
    }

    /// Emit the terminal frame.
    pub async fn done(
        &mut self,
        state: TaskState,
        iterations: u32,
        total_steps: u64,
    ) -> Result<(), StreamError> {
        let task_id = self.task_id.clone();
        self.send(TaskEvent::Done {
            task_id,
            state,
            iterations,
            total_steps,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn publisher() -> (TaskPublisher, mpsc::Receiver<TaskEvent>) {
        TaskPublisher::channel(TaskId::from("task-1"), 16)
    }

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (mut publisher, mut rx) = publisher();
        publisher.status(TaskState::Working).await.unwrap();
        publisher
            .chunk("partial", false, Visibility::Full)
            .await
            .unwrap();
        publisher
            .done(TaskState::Completed, 1, 2)
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap().event_type(), "status");
        assert_eq!(rx.recv().await.unwrap().event_type(), "message_chunk");
        assert_eq!(rx.recv().await.unwrap().event_type(), "done");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn done_rejects_non_terminal_state() {
        let (mut publisher, _rx) = publisher();
        let err = publisher
            .done(TaskState::Working, 1, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::NonTerminalDone { .. }));
    }

    #[tokio::test]
    async fn done_accepts_every_terminal_state() {
        for state in [TaskState::Completed, TaskState::Failed, TaskState::Cancelled] {
            let (mut publisher, _rx) = publisher();
            publisher.done(state, 0, 0).await.unwrap();
        }
    }

    #[tokio::test]
    async fn nothing_may_follow_done() {
        let (mut publisher, _rx) = publisher();
        publisher.done(TaskState::Completed, 1, 1).await.unwrap();
        let err = publisher.status(TaskState::Working).await.unwrap_err();
        assert!(matches!(err, StreamError::AlreadyTerminated));
    }

    #[tokio::test]
    async fn dropped_consumer_surfaces_as_disconnected() {
        let (mut publisher, rx) = publisher();
        drop(rx);
        assert!(publisher.is_closed());
        let err = publisher.status(TaskState::Working).await.unwrap_err();
        assert!(matches!(err, StreamError::Disconnected));
    }

    #[tokio::test]
    async fn step_frames_carry_seq_and_visibility() {
        let (mut publisher, mut rx) = publisher();
        let mut step = ReasoningStep::thinking("pondering")
            .with_visibility(Visibility::Summary);
        step.seq = 7;
        publisher.step(&step).await.unwrap();

        match rx.recv().await.unwrap() {
            TaskEvent::Step {
                seq,
                visibility,
                summary,
                ..
            } => {
                assert_eq!(seq, 7);
                assert_eq!(visibility, Visibility::Summary);
                assert!(summary.contains("pondering"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
