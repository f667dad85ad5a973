//! # pep-llm
//!
//! The text-generation capability used for synthesis, lay summaries and the
//! full compliance audit, plus its default implementation over the Anthropic
//! Messages API.

mod anthropic;
mod error;

pub use anthropic::AnthropicClient;
pub use error::LlmError;

use async_trait::async_trait;
use pep_core::Usage;
use serde::{Deserialize, Serialize};

/// One generation request: a fixed system instruction plus a user prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

/// Raw generated text and the tokens it cost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: Usage,
}

/// An external text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when the provider fails or returns no text.
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, LlmError>;

    /// Model identifier, for logs and run records.
    fn model(&self) -> &str;
}
