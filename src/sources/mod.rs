//! Turning raw inputs (links and images) into content the LLM can use.

mod image;
mod video;
mod webpage;

pub use image::{mime_from_name, ImagePayload};
pub use video::{transcribe_video, AudioDownloader, PendingDownload, YtDlpDownloader};
pub use webpage::{extract_text_from_html, RequestFetcher};

use crate::config::SourcesConfig;
use crate::error::{ColunchError, Result};
use crate::providers::{ContentPart, LlmProvider};
use log::info;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Every kind of input the pipeline knows how to read
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// A recipe web page
    Webpage(String),
    /// A cooking video whose audio is transcribed
    Video(String),
    Image(ImagePayload),
}

/// What a source resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    Text(String),
    Image(ContentPart),
}

impl Source {
    /// Classify a link by its host.
    ///
    /// The scheme is dropped and the remainder is compared, case-insensitively,
    /// against the configured host prefixes.
    pub fn classify(link: &str, config: &SourcesConfig) -> Result<Source> {
        let link = link.trim();
        let lowered = link.to_lowercase();
        let base = lowered
            .strip_prefix("https://")
            .or_else(|| lowered.strip_prefix("http://"))
            .unwrap_or(&lowered);

        let matches = |hosts: &[String]| hosts.iter().any(|host| base.starts_with(&host.to_lowercase()));

        if matches(&config.webpage_hosts) {
            Ok(Source::Webpage(link.to_string()))
        } else if matches(&config.video_hosts) {
            Ok(Source::Video(link.to_string()))
        } else {
            Err(ColunchError::UnsupportedSource(link.to_string()))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Webpage(url) | Source::Video(url) => f.write_str(url),
            Source::Image(image) => write!(f, "image ({}, {} bytes)", image.mime, image.bytes.len()),
        }
    }
}

/// Resolves sources to text or image content
pub struct SourceExtractor {
    fetcher: RequestFetcher,
    downloader: Arc<dyn AudioDownloader>,
    provider: Arc<dyn LlmProvider>,
    audio_dir: PathBuf,
    config: SourcesConfig,
}

impl SourceExtractor {
    pub fn new(
        config: &SourcesConfig,
        provider: Arc<dyn LlmProvider>,
        downloader: Arc<dyn AudioDownloader>,
    ) -> Result<Self> {
        Ok(Self {
            fetcher: RequestFetcher::new(config.fetch_timeout())?,
            downloader,
            provider,
            audio_dir: config.audio_dir.clone(),
            config: config.clone(),
        })
    }

    /// Extractor with the `yt-dlp` downloader named in the configuration
    pub fn from_config(config: &SourcesConfig, provider: Arc<dyn LlmProvider>) -> Result<Self> {
        let downloader = Arc::new(YtDlpDownloader::new(config.downloader.clone()));
        Self::new(config, provider, downloader)
    }

    pub fn config(&self) -> &SourcesConfig {
        &self.config
    }

    pub fn classify(&self, link: &str) -> Result<Source> {
        Source::classify(link, &self.config)
    }

    pub async fn resolve(&self, source: &Source) -> Result<Extracted> {
        match source {
            Source::Webpage(url) => {
                info!("Fetching web page {}", url);
                Ok(Extracted::Text(self.fetcher.fetch_text(url).await?))
            }
            Source::Video(url) => {
                let transcript = transcribe_video(
                    url,
                    self.downloader.clone(),
                    &self.audio_dir,
                    self.provider.as_ref(),
                )
                .await?;
                Ok(Extracted::Text(transcript))
            }
            Source::Image(image) => Ok(Extracted::Image(image.to_content_part())),
        }
    }

    /// Resolve a source that is expected to produce text
    pub async fn resolve_text(&self, source: &Source) -> Result<String> {
        match self.resolve(source).await? {
            Extracted::Text(text) => Ok(text),
            Extracted::Image(_) => Err(ColunchError::UnsupportedSource(source.to_string())),
        }
    }

    /// Resolve a link to text, failing for hosts no extractor understands
    pub async fn link_to_text(&self, link: &str) -> Result<String> {
        self.resolve_text(&self.classify(link)?).await
    }
}
