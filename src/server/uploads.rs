use crate::error::{ColunchError, Result};
use crate::model::new_id;
use crate::sources::ImagePayload;
use log::{debug, info};
use std::path::Path;

const DEFAULT_EXTENSION: &str = "jpeg";

/// Write an uploaded image under a fresh `<id>.<ext>` name and return the name
pub async fn save_upload(dir: &Path, filename: Option<&str>, bytes: &[u8]) -> Result<String> {
    let extension = filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| is_extension(ext))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    let name = format!("{}.{}", new_id(), extension);
    tokio::fs::write(dir.join(&name), bytes).await?;
    debug!("Saved upload {} ({} bytes)", name, bytes.len());
    Ok(name)
}

/// Whether `name` could have come from [`save_upload`]
pub fn is_upload_name(name: &str) -> bool {
    match name.split_once('.') {
        Some((stem, extension)) => {
            stem.len() == 32
                && stem.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
                && is_extension(extension)
        }
        None => false,
    }
}

fn is_extension(extension: &str) -> bool {
    (1..=5).contains(&extension.len()) && extension.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Read uploaded images and delete them. Every named file is removed even
/// when another one fails to load.
pub async fn take_uploads(dir: &Path, names: &[String]) -> Result<Vec<ImagePayload>> {
    let mut images = Vec::with_capacity(names.len());
    let mut failure = None;

    for name in names {
        if !is_upload_name(name) {
            failure.get_or_insert(ColunchError::InvalidUpload(name.clone()));
            continue;
        }
        let path = dir.join(name);
        match ImagePayload::from_path(&path).await {
            Ok(image) => images.push(image),
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
        if let Err(e) = tokio::fs::remove_file(&path).await {
            debug!("Could not remove upload {}: {}", path.display(), e);
        }
    }

    match failure {
        Some(e) => Err(e),
        None => {
            info!("Read {} uploaded image(s)", images.len());
            Ok(images)
        }
    }
}
