//! Input types: uploaded images and the conversion request wrapping them.

use crate::error::UploadError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// One uploaded image, exactly as received.
#[derive(Clone)]
pub struct UploadItem {
    /// Raw file content.
    pub bytes: Vec<u8>,
    /// Filename declared by the client, if any.
    pub filename: Option<String>,
    /// Content type declared by the client, if any.
    pub content_type: Option<String>,
}

impl fmt::Debug for UploadItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadItem")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl UploadItem {
    pub fn new(
        bytes: impl Into<Vec<u8>>,
        filename: Option<String>,
        content_type: Option<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            filename,
            content_type,
        }
    }

    /// Read a local file, deriving the content type from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let content_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(guess_content_type);
        Ok(Self {
            bytes,
            filename,
            content_type,
        })
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Declared filename, or a placeholder for log and error messages.
    pub fn display_name(&self) -> &str {
        self.filename.as_deref().unwrap_or("<unnamed>")
    }
}

/// Map a file extension to an `image/*` MIME type using the `image` crate's
/// format table.
pub fn guess_content_type(extension: &str) -> Option<String> {
    image::ImageFormat::from_extension(extension).map(|f| f.to_mime_type().to_string())
}

/// Output layout requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversionMode {
    /// Every image becomes one page of a single PDF.
    SinglePdf,
    /// Every image becomes its own PDF; the PDFs are bundled in one ZIP.
    MultiplePdfsZip,
}

impl ConversionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMode::SinglePdf => "SINGLE_PDF",
            ConversionMode::MultiplePdfsZip => "MULTIPLE_PDFS_ZIP",
        }
    }
}

impl fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionMode {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "SINGLE_PDF" => Ok(ConversionMode::SinglePdf),
            "MULTIPLE_PDFS_ZIP" => Ok(ConversionMode::MultiplePdfsZip),
            other => Err(UploadError::UnknownConversionType(other.to_string())),
        }
    }
}

/// An ordered batch of uploads plus the requested output layout.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub items: Vec<UploadItem>,
    pub mode: ConversionMode,
}

impl ConversionRequest {
    pub fn new(items: Vec<UploadItem>, mode: ConversionMode) -> Self {
        Self { items, mode }
    }
}
