use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while creating, storing or serving recipes
#[derive(Error, Debug)]
pub enum ColunchError {
    /// The LLM provider answered with an explicit error field
    #[error("Upstream API error: {message}")]
    Upstream { message: String, body: Value },

    /// A link whose host matches none of the known extractors
    #[error("Unable to process url: {0}")]
    UnsupportedSource(String),

    /// Requested recipe does not exist
    #[error("Recipe not found: {0}")]
    NotFound(String),

    /// Neither a description nor any images were given
    #[error("Provide a description or images")]
    EmptyInput,

    /// The provider produced a reply that is not plain text
    #[error("Unexpected reply from provider: {0}")]
    UnexpectedReply(String),

    /// A provider or index response lacked a required field
    #[error("Response is missing the '{field}' field: {body}")]
    MissingField { field: &'static str, body: Value },

    /// An uploaded file that is malformed or not one of ours
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// Audio download failed
    #[error("Download failed: {0}")]
    Download(String),

    /// Network failure talking to an external API
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Relational store error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A blocking task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ColunchError>;

impl ColunchError {
    /// Build an upstream error from a provider body carrying an `error` field
    pub fn upstream(body: Value) -> Self {
        let message = match &body["error"] {
            Value::String(s) => s.clone(),
            other => other["message"]
                .as_str()
                .map(String::from)
                .unwrap_or_else(|| other.to_string()),
        };
        ColunchError::Upstream { message, body }
    }
}
