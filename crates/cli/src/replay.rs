//! Replayed completions for reproducible runs.
//!
//! `baton run` takes a script file instead of a live model: a JSON array of
//! turns, each either a structured wire decision (`"turn"`) or raw text
//! (`"text"`, which exercises the parser's diagnostic path). Turns are
//! handed out in file order; running past the end of the script is a
//! transport failure, which the engine reports as a failed run.
//!
//! ```json
//! [
//!   {"turn": {"thought": "compute it", "action": "calculator",
//!             "action_input": {"expression": "2 + 2"}, "is_final": false},
//!    "prompt_tokens": 40, "completion_tokens": 21},
//!   {"turn": {"thought": "done", "final_answer": "4", "is_final": true}}
//! ]
//! ```

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::Deserialize;

use baton_core::{Completion, CompletionClient, CompletionError, Usage};

/// One scripted model turn.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptTurn {
    /// Structured wire decision, serialized into the completion text
    #[serde(default)]
    turn: Option<serde_json::Value>,

    /// Raw completion text, passed to the parser as-is
    #[serde(default)]
    text: Option<String>,

    #[serde(default)]
    prompt_tokens: Option<u32>,

    #[serde(default)]
    completion_tokens: Option<u32>,

    #[serde(default)]
    cost_usd: Option<f64>,
}

impl ScriptTurn {
    fn into_completion(self, index: usize) -> anyhow::Result<Completion> {
        let text = match (self.text, self.turn) {
            (Some(text), _) => text,
            (None, Some(turn)) => serde_json::to_string(&turn)?,
            (None, None) => anyhow::bail!("turn {index} has neither 'turn' nor 'text'"),
        };

        let mut completion = Completion::new(text);
        if self.prompt_tokens.is_some() || self.completion_tokens.is_some() {
            let prompt_tokens = self.prompt_tokens.unwrap_or(0);
            let completion_tokens = self.completion_tokens.unwrap_or(0);
            completion = completion.with_usage(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            });
        }
        if let Some(cost_usd) = self.cost_usd {
            completion = completion.with_cost(cost_usd);
        }
        Ok(completion)
    }
}

/// Hands out scripted completions in file order.
#[derive(Debug)]
pub struct ReplayClient {
    turns: Mutex<VecDeque<Completion>>,
}

impl ReplayClient {
    /// Load a script file: a JSON array of turns.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading replay script {}", path.display()))?;
        let turns: Vec<ScriptTurn> = serde_json::from_str(&content)
            .with_context(|| format!("parsing replay script {}", path.display()))?;
        let completions = turns
            .into_iter()
            .enumerate()
            .map(|(index, turn)| turn.into_completion(index))
            .collect::<anyhow::Result<VecDeque<_>>>()?;

        tracing::debug!(
            script = %path.display(),
            turns = completions.len(),
            "replay script loaded"
        );
        Ok(Self {
            turns: Mutex::new(completions),
        })
    }

    /// Turns left in the script.
    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for ReplayClient {
    fn name(&self) -> &str {
        "replay"
    }

    async fn complete(
        &self,
        _prompt: &str,
    ) -> std::result::Result<Completion, CompletionError> {
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| CompletionError::Transport("replay script exhausted".into()))
    }
}
