//! Result types returned by the conversion entry points.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which kind of file an artifact is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Pdf,
    Zip,
}

impl ArtifactKind {
    /// MIME type used when the artifact is downloaded.
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "application/pdf",
            ArtifactKind::Zip => "application/zip",
        }
    }

    /// Infer the kind from a filename suffix; anything but `.zip` is a PDF.
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".zip") {
            ArtifactKind::Zip
        } else {
            ArtifactKind::Pdf
        }
    }
}

/// A generated file ready to be downloaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Absolute location under the configured temp directory.
    pub path: PathBuf,
    /// Bare filename, unique per conversion.
    pub filename: String,
    pub size_bytes: u64,
    pub kind: ArtifactKind,
}

impl OutputArtifact {
    pub(crate) fn from_path(path: PathBuf, kind: ArtifactKind) -> std::io::Result<Self> {
        let size_bytes = std::fs::metadata(&path)?.len();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            path,
            filename,
            size_bytes,
            kind,
        })
    }
}

/// Outcome for one image of the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// 1-indexed position in the batch.
    pub index: usize,
    /// Filename declared at upload.
    pub filename: Option<String>,
    /// Page number in the single document, when converted in that mode.
    pub page: Option<usize>,
    /// Archive entry name, when converted in archive mode.
    pub entry: Option<String>,
    /// Set when the image was skipped.
    pub error: Option<ImageError>,
}

impl ImageResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for one conversion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    pub total_images: usize,
    pub processed_images: usize,
    pub failed_images: usize,
    pub duration_ms: u64,
}

/// Everything a caller needs after a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    pub artifact: OutputArtifact,
    pub images: Vec<ImageResult>,
    pub stats: ConversionStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_filename() {
        assert_eq!(ArtifactKind::from_filename("a.zip"), ArtifactKind::Zip);
        assert_eq!(ArtifactKind::from_filename("A.ZIP"), ArtifactKind::Zip);
        assert_eq!(ArtifactKind::from_filename("a.pdf"), ArtifactKind::Pdf);
        assert_eq!(ArtifactKind::from_filename("noext"), ArtifactKind::Pdf);
    }

    #[test]
    fn kind_content_types() {
        assert_eq!(ArtifactKind::Zip.content_type(), "application/zip");
        assert_eq!(ArtifactKind::Pdf.content_type(), "application/pdf");
    }

    #[test]
    fn artifact_from_path_reads_size() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("converted_x.pdf");
        std::fs::write(&path, b"%PDF-1.5").unwrap();
        let a = OutputArtifact::from_path(path, ArtifactKind::Pdf).unwrap();
        assert_eq!(a.filename, "converted_x.pdf");
        assert_eq!(a.size_bytes, 8);
    }
}
