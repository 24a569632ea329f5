//! The ReAct reasoning loop: Thought, Action, Observation, repeat.
//!
//! One engine value is cheap to clone and safe to share across tasks; each
//! run owns its task, chain, and event stream for the duration. The loop
//! asks the completion client for a JSON decision, records it on the chain,
//! dispatches tool calls, and stops on a final answer, a clarification
//! question, a transport failure, or budget exhaustion. Consumers observe
//! runs through the event stream; dropping the receiver cancels the run at
//! the next send.
//!
//! Step visibility policy: model thoughts are `Full`, parse diagnostics are
//! `Hidden`, tool activity and the synthesis are tagged by the dispatcher
//! and loop as `Full` and `Summary` respectively, and the final answer
//! chunk is `Summary` so summary-level consumers still receive the answer.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use baton_core::{
    Completion, CompletionClient, ExecutionContext, Message, ReasoningChain, ReasoningStep,
    Result, StepKind, StreamError, Task, TaskState, ToolCallContext, ToolRegistry, Visibility,
};
use baton_stream::{DEFAULT_CHANNEL_CAPACITY, TaskEvent, TaskPublisher};

use crate::dispatcher::ToolDispatcher;
use crate::parser::{ParsedResponse, parse_model_response};
use crate::prompt::{build_iteration_prompt, build_system_prompt};

/// Recent steps rendered into each iteration prompt.
const EXCERPT_STEPS: usize = 12;

/// How a run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum RunVerdict {
    /// The model produced a final answer.
    Completed { answer: String },

    /// The model asked the user a question; the run paused without a
    /// terminal frame.
    NeedsClarification { question: String },

    /// The iteration budget ran out before an answer.
    Exhausted,

    /// The consumer dropped the event stream mid-run.
    Cancelled,

    /// The run could not proceed, e.g. a completion transport failure.
    Failed { reason: String },
}

impl RunVerdict {
    pub fn is_success(&self) -> bool {
        matches!(self, RunVerdict::Completed { .. })
    }
}

/// Everything a caller gets back from one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub verdict: RunVerdict,
    pub task: Task,
    pub chain: ReasoningChain,
    pub iterations: u32,
}

/// The reasoning engine.
#[derive(Clone)]
pub struct ReactEngine {
    client: Arc<dyn CompletionClient>,
    dispatcher: ToolDispatcher,
    agent_id: String,
    max_iterations: u32,
    channel_capacity: usize,
}

impl ReactEngine {
    /// Engine over the in-process dispatcher with default settings.
    pub fn new(client: Arc<dyn CompletionClient>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            client,
            dispatcher: ToolDispatcher::in_process(registry),
            agent_id: "orchestrator".into(),
            max_iterations: 10,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    /// Iteration budget per run, clamped to at least 1.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Replace the dispatcher, e.g. to run tools on a different backend.
    pub fn with_dispatcher(mut self, dispatcher: ToolDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Run a task to its verdict, discarding events.
    pub async fn run(&self, task: Task, ctx: &ExecutionContext) -> Result<RunReport> {
        let (publisher, mut rx) = TaskPublisher::channel(task.id.clone(), self.channel_capacity);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        let report = self.drive(task, ctx.clone(), publisher).await;
        let _ = drain.await;
        report
    }

    /// Run a task, streaming events to the returned receiver. The report
    /// arrives through the join handle once the stream ends.
    pub fn run_streaming(
        &self,
        task: Task,
        ctx: ExecutionContext,
    ) -> (mpsc::Receiver<TaskEvent>, JoinHandle<Result<RunReport>>) {
        let (publisher, rx) = TaskPublisher::channel(task.id.clone(), self.channel_capacity);
        let engine = self.clone();
        let handle = tokio::spawn(async move { engine.drive(task, ctx, publisher).await });
        (rx, handle)
    }

    /// Delegate a subtask to a child run with half this engine's iteration
    /// budget. Fails fast when the depth bound is reached; callers gate with
    /// `ctx.can_spawn_sub_agent()` for the soft path. The child's chain is
    /// linked onto `parent_chain`.
    pub async fn delegate(
        &self,
        ctx: &ExecutionContext,
        parent_task: &Task,
        parent_chain: &mut ReasoningChain,
        skill_name: &str,
        subtask_prompt: &str,
    ) -> Result<RunReport> {
        let child_ctx = ctx.create_child_context(parent_task.id.clone(), skill_name)?;
        let child_budget = ctx.get_iteration_budget_for_child(self.max_iterations);
        let child_agent = format!("{}/{}", self.agent_id, skill_name);
        let child_engine = self
            .clone()
            .with_agent_id(&child_agent)
            .with_max_iterations(child_budget);
        let child_task = Task::new(child_agent, subtask_prompt);

        info!(
            parent_task = %parent_task.id,
            skill = skill_name,
            depth = child_ctx.depth,
            budget = child_budget,
            "delegating subtask"
        );

        let report = child_engine.run(child_task, &child_ctx).await?;
        parent_chain.add_child(report.chain.id.clone());
        Ok(report)
    }

    // ── The loop ──────────────────────────────────────────────────────────

    async fn drive(
        &self,
        mut task: Task,
        ctx: ExecutionContext,
        mut publisher: TaskPublisher,
    ) -> Result<RunReport> {
        let mut chain = ReasoningChain::new(task.id.clone(), &self.agent_id);
        let budget = self.max_iterations.max(1);
        let system_prompt =
            build_system_prompt(&self.agent_id, &self.dispatcher.registry().definitions());

        info!(
            task_id = %task.id,
            agent_id = %self.agent_id,
            depth = ctx.depth,
            budget,
            "run started"
        );

        task.set_state(TaskState::Working);
        if !still_streaming(publisher.status(TaskState::Working).await)? {
            return Ok(self.cancelled(task, chain, 0));
        }

        let mut iterations = 0u32;
        while iterations < budget {
            iterations += 1;
            let excerpt = chain.render_excerpt(EXCERPT_STEPS);
            let prompt = format!(
                "{system_prompt}\n\n{}",
                build_iteration_prompt(task.prompt().unwrap_or(""), &excerpt, iterations, budget)
            );

            let completion = match self.client.complete(&prompt).await {
                Ok(completion) => completion,
                Err(err) => {
                    warn!(task_id = %task.id, error = %err, "completion failed");
                    if !still_streaming(
                        publisher.error("completion_failed", err.to_string()).await,
                    )? {
                        return Ok(self.cancelled(task, chain, iterations));
                    }
                    return self
                        .finish_failed(
                            task,
                            chain,
                            publisher,
                            iterations,
                            format!("completion failed: {err}"),
                        )
                        .await;
                }
            };
            chain.record_llm_call();

            let parsed = parse_model_response(&completion.text);
            let mut usage = pending_usage(&completion);

            // The thought lands first; an undecided turn still records a
            // (hidden) diagnostic so the transcript explains the spent
            // iteration.
            if let Some(text) = thinking_text(&parsed, &completion) {
                let visibility = if parsed.is_undecided() {
                    Visibility::Hidden
                } else {
                    Visibility::Full
                };
                let step =
                    attach_usage(ReasoningStep::thinking(text), &mut usage).with_visibility(visibility);
                chain.append_step(step);
                if !self.publish_last(&chain, &mut publisher).await? {
                    return Ok(self.cancelled(task, chain, iterations));
                }
            }

            if let Some(answer) = parsed.final_answer {
                let sources = chain.seqs_of_kind(StepKind::ToolResult);
                let step = attach_usage(ReasoningStep::synthesis(&answer, sources), &mut usage)
                    .with_visibility(Visibility::Summary);
                chain.append_step(step);
                if !self.publish_last(&chain, &mut publisher).await? {
                    return Ok(self.cancelled(task, chain, iterations));
                }
                return self
                    .finish_completed(task, chain, publisher, iterations, answer)
                    .await;
            }

            if let Some(question) = parsed.clarification_question {
                info!(task_id = %task.id, "clarification requested, pausing run");
                chain.pause();
                if !still_streaming(publisher.clarification(&question).await)? {
                    return Ok(self.cancelled(task, chain, iterations));
                }
                // No done frame: the task is not terminal and resumes when
                // the user answers. The stream closes on publisher drop.
                return Ok(RunReport {
                    verdict: RunVerdict::NeedsClarification { question },
                    task,
                    chain,
                    iterations,
                });
            }

            if let Some(tool_name) = parsed.action {
                let arguments = parsed
                    .action_input
                    .unwrap_or_else(|| serde_json::json!({}));
                let call_ctx = ToolCallContext::new(task.id.clone(), &self.agent_id)
                    .with_trace(ctx.root_task_id.to_string())
                    .with_chain(chain.id.clone());

                let before = chain.len();
                let result = self
                    .dispatcher
                    .execute(&tool_name, arguments, &call_ctx, &mut chain)
                    .await;

                let mut disconnected = false;
                for step in chain.steps().iter().skip(before) {
                    if !still_streaming(publisher.step(step).await)? {
                        disconnected = true;
                        break;
                    }
                }
                if disconnected {
                    return Ok(self.cancelled(task, chain, iterations));
                }

                if !result.success {
                    let code = result
                        .error_code
                        .as_deref()
                        .unwrap_or("tool_execution_failed");
                    let message = result.error.clone().unwrap_or_else(|| "tool failed".into());
                    if !still_streaming(publisher.error(code, message).await)? {
                        return Ok(self.cancelled(task, chain, iterations));
                    }
                }
                continue;
            }

            debug!(task_id = %task.id, iteration = iterations, "undecided completion");
        }

        // Budget exhausted without an answer.
        warn!(task_id = %task.id, budget, "iteration budget exhausted");
        task.set_state(TaskState::Failed);
        chain.fail();
        let message = format!("no final answer after {budget} iterations");
        if still_streaming(publisher.error("budget_exhausted", message).await)? {
            still_streaming(
                publisher
                    .done(TaskState::Failed, iterations, chain.metrics.total_steps)
                    .await,
            )?;
        }

        Ok(RunReport {
            verdict: RunVerdict::Exhausted,
            task,
            chain,
            iterations,
        })
    }

    // ── Terminal paths ────────────────────────────────────────────────────

    async fn finish_completed(
        &self,
        mut task: Task,
        mut chain: ReasoningChain,
        mut publisher: TaskPublisher,
        iterations: u32,
        answer: String,
    ) -> Result<RunReport> {
        task.push_message(Message::assistant(&answer));
        task.set_state(TaskState::Completed);
        chain.complete();
        info!(task_id = %task.id, iterations, "run completed");

        let mut live =
            still_streaming(publisher.chunk(&answer, true, Visibility::Summary).await)?;
        if live {
            live = still_streaming(
                publisher
                    .artifact(
                        "answer",
                        serde_json::json!({ "text": answer.clone() }),
                        Visibility::Full,
                    )
                    .await,
            )?;
        }
        if live {
            still_streaming(
                publisher
                    .done(TaskState::Completed, iterations, chain.metrics.total_steps)
                    .await,
            )?;
        }

        Ok(RunReport {
            verdict: RunVerdict::Completed { answer },
            task,
            chain,
            iterations,
        })
    }

    async fn finish_failed(
        &self,
        mut task: Task,
        mut chain: ReasoningChain,
        mut publisher: TaskPublisher,
        iterations: u32,
        reason: String,
    ) -> Result<RunReport> {
        task.set_state(TaskState::Failed);
        chain.fail();
        still_streaming(
            publisher
                .done(TaskState::Failed, iterations, chain.metrics.total_steps)
                .await,
        )?;
        Ok(RunReport {
            verdict: RunVerdict::Failed { reason },
            task,
            chain,
            iterations,
        })
    }

    fn cancelled(&self, mut task: Task, mut chain: ReasoningChain, iterations: u32) -> RunReport {
        info!(task_id = %task.id, iterations, "consumer disconnected, cancelling run");
        task.set_state(TaskState::Cancelled);
        chain.fail();
        RunReport {
            verdict: RunVerdict::Cancelled,
            task,
            chain,
            iterations,
        }
    }

    async fn publish_last(
        &self,
        chain: &ReasoningChain,
        publisher: &mut TaskPublisher,
    ) -> Result<bool> {
        match chain.last_step() {
            Some(step) => still_streaming(publisher.step(step).await),
            None => Ok(true),
        }
    }
}

/// Ok(true) while the stream accepts frames; Ok(false) once the consumer
/// disconnected. Other stream errors are contract violations and propagate.
fn still_streaming(sent: std::result::Result<(), StreamError>) -> Result<bool> {
    match sent {
        Ok(()) => Ok(true),
        Err(StreamError::Disconnected) => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn pending_usage(completion: &Completion) -> Option<(u32, f64)> {
    let tokens = completion
        .usage
        .as_ref()
        .map(|usage| usage.total_tokens)
        .unwrap_or(0);
    let cost = completion.cost_usd.unwrap_or(0.0);
    (tokens > 0 || cost > 0.0).then_some((tokens, cost))
}

/// Attach the completion's usage to the first step recorded for it.
fn attach_usage(step: ReasoningStep, usage: &mut Option<(u32, f64)>) -> ReasoningStep {
    match usage.take() {
        Some((tokens, cost)) => step.with_usage(tokens, cost),
        None => step,
    }
}

/// The text for this turn's thinking step, if one should be recorded.
fn thinking_text(parsed: &ParsedResponse, completion: &Completion) -> Option<String> {
    if let Some(thought) = &parsed.thought {
        return Some(thought.clone());
    }
    if parsed.is_undecided() {
        let text = if completion.text.trim().is_empty() {
            "[Parse error: empty response]"
        } else {
            "[Parse error: no decision]"
        };
        return Some(text.to_string());
    }
    None
}

// ── Tests ─────────────────────────────────────────────────────────────────
