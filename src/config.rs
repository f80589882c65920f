use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::prompt::Preferences;

/// Main application configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Preferences folded into the recipe system prompt
    #[serde(default)]
    pub preferences: Preferences,
}

/// HTTP server settings
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_addr")]
    pub addr: String,
    /// Where uploaded images wait until their WebSocket picks them up
    #[serde(default = "std::env::temp_dir")]
    pub upload_dir: PathBuf,
    /// Phrase used to populate the recipe list on the home page
    #[serde(default = "default_initial_search")]
    pub initial_search: String,
    /// Number of recipes shown in a search result list
    #[serde(default = "default_search_results")]
    pub search_results: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            upload_dir: std::env::temp_dir(),
            initial_search: default_initial_search(),
            search_results: default_search_results(),
        }
    }
}

/// Settings for the OpenAI-compatible LLM API
#[derive(Debug, Deserialize, Clone)]
pub struct OpenAiConfig {
    /// API key (falls back to OPENAI_API_KEY)
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chat model (falls back to OPENAI_MODEL, then gpt-4-turbo-preview)
    pub model: Option<String>,
    /// Model used when images are part of the request
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Maximum tokens for vision completions
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: None,
            vision_model: default_vision_model(),
            transcription_model: default_transcription_model(),
            embedding_model: default_embedding_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl OpenAiConfig {
    /// Chat model after applying the OPENAI_MODEL fallback
    pub fn chat_model(&self) -> String {
        self.model
            .clone()
            .or_else(|| std::env::var("OPENAI_MODEL").ok())
            .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Which hosts are understood and how they are fetched
#[derive(Debug, Deserialize, Clone)]
pub struct SourcesConfig {
    /// Host prefixes served as recipe web pages
    #[serde(default = "default_webpage_hosts")]
    pub webpage_hosts: Vec<String>,
    /// Host prefixes served as videos (audio is transcribed)
    #[serde(default = "default_video_hosts")]
    pub video_hosts: Vec<String>,
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
    /// Audio downloader executable
    #[serde(default = "default_downloader")]
    pub downloader: String,
    /// Directory for temporary audio downloads
    #[serde(default = "std::env::temp_dir")]
    pub audio_dir: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            webpage_hosts: default_webpage_hosts(),
            video_hosts: default_video_hosts(),
            fetch_timeout_secs: default_fetch_timeout(),
            downloader: default_downloader(),
            audio_dir: std::env::temp_dir(),
        }
    }
}

impl SourcesConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Recipe storage backend. Only one is ever active.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Pinecone,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_sqlite_url")]
    pub sqlite_url: String,
    #[serde(default)]
    pub pinecone: PineconeConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            sqlite_url: default_sqlite_url(),
            pinecone: PineconeConfig::default(),
        }
    }
}

/// Pinecone index settings
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PineconeConfig {
    /// API key (falls back to PINECONE_API_KEY)
    pub api_key: Option<String>,
    /// Data-plane host of the `recipes` index, e.g. https://recipes-abc123.svc.pinecone.io
    pub index_host: Option<String>,
    pub namespace: Option<String>,
}

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4-turbo-preview";

// Default value functions
fn default_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_initial_search() -> String {
    "Warming winter stew".to_string()
}

fn default_search_results() -> usize {
    5
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_vision_model() -> String {
    "gpt-4-vision-preview".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_tokens() -> u32 {
    3000
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_webpage_hosts() -> Vec<String> {
    vec!["www.bbcgoodfood.com".to_string()]
}

fn default_video_hosts() -> Vec<String> {
    vec![
        "www.youtube.com".to_string(),
        "youtube.com".to_string(),
        "m.youtube.com".to_string(),
        "youtu.be".to_string(),
    ]
}

fn default_fetch_timeout() -> u64 {
    20
}

fn default_downloader() -> String {
    "yt-dlp".to_string()
}

fn default_sqlite_url() -> String {
    "sqlite://colunch.db?mode=rwc".to_string()
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with COLUNCH__ prefix
    /// 2. colunch.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: COLUNCH__OPENAI__MODEL
    pub fn load() -> Result<Self, ConfigError> {
        load_config("colunch")
    }
}

/// Load configuration from the named file (extension optional) and the environment
pub fn load_config(file: &str) -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix("COLUNCH")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("sources.webpage_hosts")
                .with_list_parse_key("sources.video_hosts")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
