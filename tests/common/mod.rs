#![allow(dead_code)]

use async_trait::async_trait;
use colunch::config::SourcesConfig;
use colunch::error::{ColunchError, Result};
use colunch::pipelines::{RecipeBook, RecipeSettings};
use colunch::prompt::Preferences;
use colunch::providers::{ChatMessage, LlmProvider, MessageContent};
use colunch::repository::{RecipeRepository, SqliteRepository};
use colunch::sources::{AudioDownloader, SourceExtractor};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const CHAT_MODEL: &str = "chat-model";
pub const VISION_MODEL: &str = "vision-model";
pub const RECIPE: &str = "#### Serves\n4\n\n#### Ingredients\n- 500g beef\n\n#### Instructions\n1. Stew it";

/// One recorded chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn last_text(&self) -> String {
        self.messages
            .last()
            .and_then(|m| m.content.as_text())
            .unwrap_or_default()
            .to_string()
    }

    /// The request that writes the recipe carries the system prompt
    pub fn is_recipe_request(&self) -> bool {
        self.messages.len() == 2
    }
}

/// Answers each prompt kind with a canned reply and records every call
pub struct FakeProvider {
    pub links: String,
    pub stripped: String,
    pub transcript: String,
    /// Transcription answers with an upstream error
    pub fail_transcription: bool,
    /// When set, the recipe reply waits for a notification
    pub recipe_gate: Option<Arc<Notify>>,
    pub requests: Mutex<Vec<ChatRequest>>,
    pub embedded: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(links: &str, stripped: &str) -> Arc<Self> {
        Arc::new(Self::plain(links, stripped))
    }

    pub fn plain(links: &str, stripped: &str) -> Self {
        Self {
            links: links.to_string(),
            stripped: stripped.to_string(),
            transcript: "Brown the beef, add stock and simmer".to_string(),
            fail_transcription: false,
            recipe_gate: None,
            requests: Mutex::new(Vec::new()),
            embedded: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn recipe_request(&self) -> Option<ChatRequest> {
        self.requests().into_iter().find(|r| r.is_recipe_request())
    }
}

/// Two dimensions: how much about stew, how much about cake
pub fn embedding_of(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    vec![
        if text.contains("stew") { 1.0 } else { 0.05 },
        if text.contains("cake") { 1.0 } else { 0.05 },
    ]
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        max_tokens: Option<u32>,
    ) -> Result<Vec<ChatMessage>> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            max_tokens,
        };
        let question = request.last_text();
        let recipe_request = request.is_recipe_request();
        self.requests.lock().unwrap().push(request);

        let reply = if recipe_request {
            if let Some(gate) = &self.recipe_gate {
                gate.notified().await;
            }
            RECIPE.to_string()
        } else if question.starts_with("Please provide all the links") {
            self.links.clone()
        } else if question.starts_with("Please remove all the text") {
            self.stripped.clone()
        } else if question.starts_with("Please provide an informative but concise name") {
            "\"Winter Beef Stew\"".to_string()
        } else if question.starts_with("Please provide an exciting") {
            "A slow cooked stew for cold nights.".to_string()
        } else if question.starts_with("Create a random phrase") {
            "Hearty winter stew".to_string()
        } else {
            return Err(ColunchError::UnexpectedReply(question));
        };
        Ok(vec![ChatMessage::assistant(reply)])
    }

    async fn transcribe(&self, audio: Vec<u8>, _filename: &str) -> Result<String> {
        assert!(!audio.is_empty());
        if self.fail_transcription {
            return Err(ColunchError::upstream(serde_json::json!({
                "error": {"message": "Audio file could not be decoded"}
            })));
        }
        Ok(self.transcript.clone())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embedded.lock().unwrap().push(text.to_string());
        Ok(embedding_of(text))
    }
}

/// Writes a small audio file, or fails after writing it
pub struct FakeDownloader {
    pub fail: bool,
    pub used_dir: Mutex<Option<PathBuf>>,
}

impl FakeDownloader {
    pub fn new(fail: bool) -> Arc<Self> {
        Arc::new(Self {
            fail,
            used_dir: Mutex::new(None),
        })
    }
}

impl AudioDownloader for FakeDownloader {
    fn download(&self, _url: &str, dir: &Path) -> Result<PathBuf> {
        let path = dir.join("audio.m4a");
        std::fs::write(&path, b"fake audio")?;
        *self.used_dir.lock().unwrap() = Some(dir.to_path_buf());
        if self.fail {
            return Err(ColunchError::Download("connection reset".to_string()));
        }
        Ok(path)
    }
}

pub fn settings() -> RecipeSettings {
    RecipeSettings {
        chat_model: CHAT_MODEL.to_string(),
        vision_model: VISION_MODEL.to_string(),
        max_tokens: 300,
        preferences: Preferences::default(),
    }
}

pub async fn memory_repository() -> Arc<SqliteRepository> {
    Arc::new(SqliteRepository::connect("sqlite::memory:").await.unwrap())
}

pub async fn recipe_book(
    provider: Arc<FakeProvider>,
    sources: SourcesConfig,
    downloader: Arc<FakeDownloader>,
) -> (RecipeBook, Arc<SqliteRepository>) {
    let repository = memory_repository().await;
    let extractor = SourceExtractor::new(&sources, provider.clone(), downloader).unwrap();
    let book = RecipeBook::new(
        provider,
        extractor,
        repository.clone() as Arc<dyn RecipeRepository>,
        settings(),
    );
    (book, repository)
}

pub fn text_of(message: &ChatMessage) -> &str {
    match &message.content {
        MessageContent::Text(text) => text,
        MessageContent::Parts(_) => "",
    }
}

/// Rough check that generated text reads as a recipe
pub fn looks_like_recipe(content: &str) -> bool {
    let content = content.to_lowercase();
    content.contains("ingredients")
        && (content.contains("instructions") || content.contains("preparation"))
        && (content.contains("serves") || content.contains("servings"))
}
