use crate::error::Result;
use crate::providers::ContentPart;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// An uploaded image. Interpretation is left to the vision model.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            bytes,
            mime: mime.into(),
        }
    }

    /// Build a payload, guessing the mime type from a file name
    pub fn from_named(bytes: Vec<u8>, filename: &str) -> Self {
        Self::new(bytes, mime_from_name(filename))
    }

    /// Read an image file
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        Ok(Self::from_named(bytes, name))
    }

    /// `data:` URL carrying the base64-encoded image
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    pub fn to_content_part(&self) -> ContentPart {
        ContentPart::image(self.data_url())
    }
}

/// Mime type for an image file name, JPEG when unknown
pub fn mime_from_name(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
