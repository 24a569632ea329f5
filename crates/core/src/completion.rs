//! The opaque prompt-completion capability.
//!
//! The engine treats the language model as `complete(prompt) -> text`.
//! Everything about providers, endpoints, and streaming lives behind this
//! trait in the embedding application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;

/// Token usage reported by a completion, when the client knows it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One model reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// Raw model text, handed to the response parser untouched
    pub text: String,

    /// Token usage, if the client reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Cost in USD, if the client prices its calls
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
            cost_usd: None,
        }
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = Some(cost_usd);
        self
    }
}

/// The completion capability the engine runs against.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// A short name for logs.
    fn name(&self) -> &str;

    /// Produce a completion for one prompt.
    async fn complete(&self, prompt: &str)
    -> std::result::Result<Completion, CompletionError>;
}
