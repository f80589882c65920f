use crate::error::{ColunchError, Result};
use crate::providers::LlmProvider;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

/// Downloads the audio track of a video. Implementations block, so they are
/// always run on the blocking thread pool.
pub trait AudioDownloader: Send + Sync {
    /// Download the best audio-only stream of `url` into `dir` and return the
    /// path of the written file.
    fn download(&self, url: &str, dir: &Path) -> Result<PathBuf>;
}

/// Audio downloader backed by the `yt-dlp` executable
pub struct YtDlpDownloader {
    program: String,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl AudioDownloader for YtDlpDownloader {
    fn download(&self, url: &str, dir: &Path) -> Result<PathBuf> {
        let template = dir.join("audio.%(ext)s");
        let output = Command::new(&self.program)
            .arg("--format")
            .arg("bestaudio")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--output")
            .arg(&template)
            .arg(url)
            .output()
            .map_err(|e| ColunchError::Download(format!("could not run {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(ColunchError::Download(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        first_file(dir)?.ok_or_else(|| ColunchError::Download("No audio.".to_string()))
    }
}

fn first_file(dir: &Path) -> Result<Option<PathBuf>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// A temporary directory holding one downloaded file. Removed on drop, so
/// the download is gone on success and failure alike.
pub struct PendingDownload {
    dir: TempDir,
}

impl PendingDownload {
    pub fn new_in(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("colunch-").tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Download the audio of `url` and transcribe it
pub async fn transcribe_video(
    url: &str,
    downloader: Arc<dyn AudioDownloader>,
    audio_dir: &Path,
    provider: &dyn LlmProvider,
) -> Result<String> {
    let pending = PendingDownload::new_in(audio_dir)?;

    info!("Getting audio for {}", url);
    let target = pending.path().to_path_buf();
    let owned_url = url.to_string();
    let audio_path =
        tokio::task::spawn_blocking(move || downloader.download(&owned_url, &target)).await??;
    info!("Got audio.");

    let audio = tokio::fs::read(&audio_path).await?;
    let filename = audio_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("audio.mp4")
        .to_string();
    debug!("Transcribing {} ({} bytes)", filename, audio.len());

    let transcript = provider.transcribe(audio, &filename).await?;
    drop(pending);
    Ok(transcript)
}
