//! The reasoning chain, an append-only ledger of steps for one task run.
//!
//! Steps are numbered by position at append time and never reordered or
//! renumbered. Aggregated metrics update on every append so they always
//! match the step list exactly. The chain is owned by the engine instance
//! running its task; nothing else mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::step::{ReasoningStep, StepKind};
use crate::task::TaskId;

// ── Data Structures ───────────────────────────────────────────────────────

/// Unique identifier for a reasoning chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub String);

impl ChainId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ChainId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a chain.
///
/// `Paused` marks a run that stopped to ask the user a clarification
/// question; it is not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStatus {
    Running,
    Completed,
    Failed,
    Paused,
}

/// Aggregated counters over a chain, maintained at append time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainMetrics {
    /// Steps appended so far
    pub total_steps: u64,

    /// Completion calls made by the engine
    pub llm_calls: u64,

    /// tool_call steps appended
    pub tool_calls: u64,

    /// Sum of per-step token counters
    pub total_tokens: u64,

    /// Sum of per-step cost counters
    pub total_cost_usd: f64,
}

/// The ordered ledger of steps produced while solving one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningChain {
    /// Unique chain ID
    pub id: ChainId,

    /// The task this chain solves
    pub task_id: TaskId,

    /// The agent running the task
    pub agent_id: String,

    /// Lifecycle status
    pub status: ChainStatus,

    /// Ordered steps, seq == index
    steps: Vec<ReasoningStep>,

    /// Aggregated counters
    pub metrics: ChainMetrics,

    /// Chains of delegated sub-runs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_chain_ids: Vec<ChainId>,

    /// When the chain was created
    pub created_at: DateTime<Utc>,

    /// When the chain last changed
    pub updated_at: DateTime<Utc>,
}

// ── Implementation ────────────────────────────────────────────────────────

impl ReasoningChain {
    /// Start a running chain for a task.
    pub fn new(task_id: TaskId, agent_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: ChainId::new(),
            task_id,
            agent_id: agent_id.into(),
            status: ChainStatus::Running,
            steps: Vec::new(),
            metrics: ChainMetrics::default(),
            child_chain_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    // ── Appending ──

    /// Append a step, assigning its sequence number and updating metrics.
    /// Returns the assigned seq.
    pub fn append_step(&mut self, mut step: ReasoningStep) -> u64 {
        let seq = self.steps.len() as u64;
        step.seq = seq;

        self.metrics.total_steps += 1;
        if step.kind() == StepKind::ToolCall {
            self.metrics.tool_calls += 1;
        }
        if let Some(tokens) = step.tokens {
            self.metrics.total_tokens += u64::from(tokens);
        }
        if let Some(cost) = step.cost_usd {
            self.metrics.total_cost_usd += cost;
        }

        tracing::debug!(
            chain_id = %self.id,
            seq,
            kind = ?step.kind(),
            "step appended"
        );

        self.steps.push(step);
        self.updated_at = Utc::now();
        seq
    }

    /// Count one completion call against this chain. Token and cost totals
    /// ride on the step that records the completion, so this only bumps the
    /// call counter.
    pub fn record_llm_call(&mut self) {
        self.metrics.llm_calls += 1;
        self.updated_at = Utc::now();
    }

    /// Link a delegated sub-run's chain.
    pub fn add_child(&mut self, child: ChainId) {
        self.child_chain_ids.push(child);
        self.updated_at = Utc::now();
    }

    // ── Status transitions ──

    pub fn complete(&mut self) {
        self.set_status(ChainStatus::Completed);
    }

    pub fn fail(&mut self) {
        self.set_status(ChainStatus::Failed);
    }

    pub fn pause(&mut self) {
        self.set_status(ChainStatus::Paused);
    }

    fn set_status(&mut self, status: ChainStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    // ── Access ──

    pub fn steps(&self) -> &[ReasoningStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn last_step(&self) -> Option<&ReasoningStep> {
        self.steps.last()
    }

    /// Seq numbers of all steps of a given kind.
    pub fn seqs_of_kind(&self, kind: StepKind) -> Vec<u64> {
        self.steps
            .iter()
            .filter(|s| s.kind() == kind)
            .map(|s| s.seq)
            .collect()
    }

    // ── Rendering ──

    /// Render the most recent steps as a transcript excerpt for prompt
    /// assembly. Hidden steps are rendered too; visibility gates external
    /// consumers, not the engine's own context.
    pub fn render_excerpt(&self, last_n: usize) -> String {
        if self.steps.is_empty() {
            return String::new();
        }
        let skip = self.steps.len().saturating_sub(last_n);
        let mut out = String::new();
        for step in &self.steps[skip..] {
            out.push_str(&step.summary());
            out.push('\n');
        }
        out
    }

    /// Brief summary of the run so far.
    pub fn summarize(&self) -> String {
        format!(
            "{} steps, {} llm calls, {} tool calls, {} tokens",
            self.metrics.total_steps,
            self.metrics.llm_calls,
            self.metrics.tool_calls,
            self.metrics.total_tokens
        )
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
