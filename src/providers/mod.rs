mod chat;
mod message;
mod open_ai;

pub use chat::Chat;
pub use message::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
pub use open_ai::OpenAIProvider;

use crate::error::Result;
use async_trait::async_trait;

/// Unified trait for LLM providers.
///
/// Every call is a single remote request. Nothing is retried; transport and
/// provider errors go straight back to the caller.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai")
    fn provider_name(&self) -> &str;

    /// Submit a conversation and return the reply messages
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
    ) -> Result<Vec<ChatMessage>>;

    /// Transcribe an audio file to text
    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String>;

    /// Embed text for similarity search
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
