use crate::error::{ColunchError, Result};
use crate::providers::{ChatMessage, LlmProvider};
use log::debug;
use std::sync::Arc;

/// A conversation with an LLM. Holds the ordered message history; every
/// completion sends the full history.
pub struct Chat {
    provider: Arc<dyn LlmProvider>,
    model: String,
    max_tokens: Option<u32>,
    messages: Vec<ChatMessage>,
}

impl Chat {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Chat {
            provider,
            model: model.into(),
            max_tokens: None,
            messages: Vec::new(),
        }
    }

    /// Start a conversation seeded with a system prompt
    pub fn from_system_prompt(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        prompt: impl Into<String>,
    ) -> Self {
        let mut chat = Chat::new(provider, model);
        chat.messages.push(ChatMessage::system(prompt));
        chat
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Append `message`, submit the conversation and append the replies.
    ///
    /// Returns the reply texts joined with newlines.
    pub async fn complete(&mut self, message: ChatMessage) -> Result<String> {
        self.messages.push(message);
        debug!(
            "Sending {} messages to {} ({})",
            self.messages.len(),
            self.provider.provider_name(),
            self.model
        );

        let replies = self
            .provider
            .chat(&self.model, &self.messages, self.max_tokens)
            .await?;

        let texts = replies
            .iter()
            .map(|reply| {
                reply.content.as_text().map(String::from).ok_or_else(|| {
                    ColunchError::UnexpectedReply(
                        "multi-part reply where text was expected".to_string(),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.messages.extend(replies);
        Ok(texts.join("\n"))
    }

    /// Ask a single plain-text question
    pub async fn ask(&mut self, question: impl Into<String>) -> Result<String> {
        self.complete(ChatMessage::user(question)).await
    }
}
