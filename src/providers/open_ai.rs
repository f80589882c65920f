use crate::config::OpenAiConfig;
use crate::error::{ColunchError, Result};
use crate::providers::{ChatMessage, LlmProvider};
use async_trait::async_trait;
use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    transcription_model: String,
    embedding_model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider from configuration
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        // Try config first, then fall back to environment variable
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| {
                ColunchError::Config(config::ConfigError::NotFound(
                    "OPENAI_API_KEY not found in config or environment".to_string(),
                ))
            })?;

        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(OpenAIProvider {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            transcription_model: config.transcription_model.clone(),
            embedding_model: config.embedding_model.clone(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        let defaults = OpenAiConfig::default();
        OpenAIProvider {
            client: Client::builder()
                .timeout(Duration::from_secs(defaults.timeout_secs))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url,
            transcription_model: defaults.transcription_model,
            embedding_model: defaults.embedding_model,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path)
    }

    /// Decode a response body, surfacing an `error` field as an upstream error
    async fn read_body(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await?;
        debug!("{} {:?}", status, body);
        if body.get("error").is_some_and(|e| !e.is_null()) {
            return Err(ColunchError::upstream(body));
        }
        Ok(body)
    }
}

#[async_trait]
impl LlmProvider for OpenAIProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
    ) -> Result<Vec<ChatMessage>> {
        let mut payload = json!({
            "model": model,
            "messages": messages,
        });
        if let Some(max_tokens) = max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let choices = body["choices"]
            .as_array()
            .filter(|choices| !choices.is_empty())
            .ok_or_else(|| ColunchError::MissingField {
                field: "choices",
                body: body.clone(),
            })?;

        choices
            .iter()
            .map(|choice| {
                let message = &choice["message"];
                match message["content"].as_str() {
                    Some(text) => Ok(ChatMessage::assistant(text)),
                    None => Err(ColunchError::UnexpectedReply(message.to_string())),
                }
            })
            .collect()
    }

    async fn transcribe(&self, audio: Vec<u8>, filename: &str) -> Result<String> {
        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .part("file", Part::bytes(audio).file_name(filename.to_string()));

        let response = self
            .client
            .post(self.url("audio/transcriptions"))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        body["text"]
            .as_str()
            .map(String::from)
            .ok_or(ColunchError::MissingField { field: "text", body })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(self.url("embeddings"))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.embedding_model,
                "input": text,
            }))
            .send()
            .await?;
        let body = Self::read_body(response).await?;

        let embedding = body["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| ColunchError::MissingField {
                field: "embedding",
                body: body.clone(),
            })?;

        embedding
            .iter()
            .map(|v| {
                v.as_f64().map(|f| f as f32).ok_or_else(|| {
                    ColunchError::UnexpectedReply(format!("non-numeric embedding entry {v}"))
                })
            })
            .collect()
    }
}
