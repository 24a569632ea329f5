//! Shared scripted completion clients for engine tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use baton_core::{Completion, CompletionClient, CompletionError, Usage};

/// Returns scripted completions in sequence; panics when over-called so a
/// looping bug fails loudly instead of hanging.
pub struct ScriptedClient {
    responses: Mutex<Vec<Completion>>,
    call_count: Mutex<usize>,
    failure: Option<String>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<Completion>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: Mutex::new(0),
            failure: None,
        }
    }

    /// A client whose every call fails with a transport error.
    pub fn failing(message: &str) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            call_count: Mutex::new(0),
            failure: Some(message.to_string()),
        }
    }

    /// One completion that finishes immediately with `answer`.
    pub fn single_final(answer: &str) -> Self {
        Self::new(vec![final_completion("ready to answer", answer)])
    }

    /// A tool call followed by a final answer.
    pub fn tool_then_final(tool: &str, arguments: serde_json::Value, answer: &str) -> Self {
        Self::new(vec![
            action_completion("using a tool", tool, arguments),
            final_completion("synthesizing", answer),
        ])
    }

    /// Raw completion texts, handed to the parser untouched.
    pub fn raw(texts: &[&str]) -> Self {
        Self::new(
            texts
                .iter()
                .map(|text| Completion::new(*text).with_usage(test_usage()))
                .collect(),
        )
    }

    pub fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str) -> Result<Completion, CompletionError> {
        if let Some(message) = &self.failure {
            return Err(CompletionError::Transport(message.clone()));
        }
        let mut count = self.call_count.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        if *count >= responses.len() {
            panic!(
                "ScriptedClient exhausted: call #{}, have {}",
                *count,
                responses.len()
            );
        }
        let response = responses[*count].clone();
        *count += 1;
        Ok(response)
    }
}

/// Delays every scripted response, giving tests a window to drop receivers
/// mid-run.
pub struct SlowClient {
    inner: ScriptedClient,
    delay: Duration,
}

impl SlowClient {
    pub fn new(inner: ScriptedClient, delay_ms: u64) -> Self {
        Self {
            inner,
            delay: Duration::from_millis(delay_ms),
        }
    }
}

#[async_trait]
impl CompletionClient for SlowClient {
    fn name(&self) -> &str {
        "slow_scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError> {
        tokio::time::sleep(self.delay).await;
        self.inner.complete(prompt).await
    }
}

pub fn test_usage() -> Usage {
    Usage {
        prompt_tokens: 10,
        completion_tokens: 5,
        total_tokens: 15,
    }
}

pub fn final_completion(thought: &str, answer: &str) -> Completion {
    let body = serde_json::json!({
        "thought": thought,
        "final_answer": answer,
        "is_final": true,
    });
    Completion::new(body.to_string())
        .with_usage(test_usage())
        .with_cost(0.001)
}

pub fn action_completion(thought: &str, tool: &str, arguments: serde_json::Value) -> Completion {
    let body = serde_json::json!({
        "thought": thought,
        "action": tool,
        "action_input": arguments,
        "is_final": false,
    });
    Completion::new(body.to_string())
        .with_usage(test_usage())
        .with_cost(0.001)
}

pub fn clarification_completion(question: &str) -> Completion {
    let body = serde_json::json!({
        "thought": "need more information",
        "clarification_question": question,
    });
    Completion::new(body.to_string()).with_usage(test_usage())
}
