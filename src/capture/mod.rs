use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read image file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("image file is empty: {path}")]
    EmptyFile { path: PathBuf },
}

pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Encoded image handed to the analysis pipeline: base64 data tagged with
/// its media type. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    /// Encodes raw image bytes, sniffing the media type from the header.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            mime_type: sniff_mime_type(bytes).to_string(),
            data: BASE64.encode(bytes),
        }
    }

    /// Wraps data that is already base64 encoded.
    pub fn from_base64(data: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self {
            mime_type: mime_type.unwrap_or(DEFAULT_MIME_TYPE).to_string(),
            data: data.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.trim().is_empty()
    }
}

/// Source of encoded images (camera, gallery, file picker).
pub trait ImageSource {
    fn acquire(&self) -> CaptureResult<ImagePayload>;
}

/// Reads a single image file from disk.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileImageSource {
    fn acquire(&self) -> CaptureResult<ImagePayload> {
        let bytes = std::fs::read(&self.path).map_err(|source| CaptureError::ReadFile {
            path: self.path.clone(),
            source,
        })?;
        if bytes.is_empty() {
            return Err(CaptureError::EmptyFile {
                path: self.path.clone(),
            });
        }
        let payload = ImagePayload::from_bytes(&bytes);
        tracing::debug!(
            path = %self.path.display(),
            mime_type = %payload.mime_type,
            bytes = bytes.len(),
            "acquired image"
        );
        Ok(payload)
    }
}

fn sniff_mime_type(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Png) => "image/png",
        Ok(ImageFormat::Jpeg) => "image/jpeg",
        Ok(ImageFormat::WebP) => "image/webp",
        Ok(ImageFormat::Gif) => "image/gif",
        Ok(ImageFormat::Bmp) => "image/bmp",
        Ok(ImageFormat::Tiff) => "image/tiff",
        _ => DEFAULT_MIME_TYPE,
    }
}
