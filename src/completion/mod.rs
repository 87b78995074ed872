//! Chat completion clients.
//!
//! The summarizer only needs single request/response completions, so the seam
//! is one method taking a system prompt and the user messages in order.

mod openai;

pub use openai::OpenAiCompletion;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for chat completion services.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one stateless completion request and return the answer text.
    async fn complete(&self, system_prompt: &str, user_messages: &[String]) -> Result<String>;
}
