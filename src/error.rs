//! Error types for the edgequake-img2pdf library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`UploadError`] (**client-caused**): the batch was rejected before any
//!   conversion work began (empty batch, unsupported format, file too large…).
//!   Surfaces as [`Img2PdfError::InvalidUpload`] and maps to HTTP 400.
//!
//! * [`Img2PdfError`] (**fatal**): the request cannot produce an artifact
//!   (output write failed, archive could not be built, no image converted).
//!   Returned as `Err(Img2PdfError)` from the top-level `convert*` functions.
//!
//! * [`ImageError`] (**non-fatal**): a single image failed to decode or embed
//!   but the rest of the batch is fine. Stored inside
//!   [`crate::output::ImageResult`] so callers can see partial success rather
//!   than losing the whole batch to one corrupt file.

use std::path::PathBuf;
use thiserror::Error;

/// Reasons an upload batch is rejected by [`crate::pipeline::validate`].
///
/// Variants are checked in declaration order; the first violation wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// No file was sent.
    #[error("No files were uploaded")]
    EmptyBatch,

    /// The batch holds more files than `max_files`.
    #[error("Maximum number of files exceeded. Maximum: {limit}, sent: {actual}")]
    TooManyFiles { actual: usize, limit: usize },

    /// A file has zero bytes.
    #[error("Empty file detected: '{filename}'")]
    EmptyFile { filename: String },

    /// The declared filename is missing or blank.
    #[error("Invalid file name")]
    InvalidFilename,

    /// The extension is not in the configured allow-set.
    #[error("Unsupported file format: '{extension}'. Allowed formats: {allowed}")]
    UnsupportedFormat { extension: String, allowed: String },

    /// The file exceeds the hard per-file size cap.
    #[error("File too large: '{filename}' ({} MB). Maximum size: {} MB", mib(.size_bytes), mib(.limit_bytes))]
    FileTooLarge {
        filename: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    /// The declared content type is missing or not `image/*`.
    #[error("Invalid file type: {content_type}. Expected an image")]
    InvalidMimeType { content_type: String },

    /// The `conversionType` form field is missing or not a known mode.
    #[error("Unknown conversion type '{0}'. Expected SINGLE_PDF or MULTIPLE_PDFS_ZIP")]
    UnknownConversionType(String),

    /// The multipart body could not be read.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),
}

fn mib(bytes: &u64) -> String {
    format!("{:.2}", *bytes as f64 / (1024.0 * 1024.0))
}

/// All fatal errors returned by the edgequake-img2pdf library.
///
/// Image-level failures use [`ImageError`] and are stored in
/// [`crate::output::ImageResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum Img2PdfError {
    // ── Client errors ─────────────────────────────────────────────────────
    /// The batch failed validation.
    #[error("{0}")]
    InvalidUpload(#[from] UploadError),

    // ── Conversion errors ─────────────────────────────────────────────────
    /// Assembly of the document or archive aborted unexpectedly (a panic
    /// inside the blocking conversion task).
    #[error("Conversion failed: {detail}")]
    Conversion { detail: String },

    /// Every image of a single-document batch failed; there is nothing to write.
    #[error("None of the {total} images could be converted.\nFirst error: {first_error}")]
    NoImagesConverted { total: usize, first_error: String },

    /// Could not create or write a generated document.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ZIP container could not be written.
    #[error("Failed to build archive '{path}': {detail}")]
    ArchiveFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Img2PdfError {
    /// `true` when the client sent a batch that failed validation.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Img2PdfError::InvalidUpload(_))
    }

    /// `true` for failures raised while assembling a document or archive.
    pub fn is_conversion_error(&self) -> bool {
        matches!(
            self,
            Img2PdfError::Conversion { .. }
                | Img2PdfError::NoImagesConverted { .. }
                | Img2PdfError::OutputWriteFailed { .. }
                | Img2PdfError::ArchiveFailed { .. }
        )
    }
}

/// A non-fatal error for a single image.
///
/// The overall conversion continues with the remaining images.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The bytes are not a decodable image.
    #[error("Image {index} ('{filename}'): decode failed: {detail}")]
    DecodeFailed {
        index: usize,
        filename: String,
        detail: String,
    },

    /// The decoded image could not be turned into a PDF page.
    #[error("Image {index} ('{filename}'): embedding failed: {detail}")]
    EmbedFailed {
        index: usize,
        filename: String,
        detail: String,
    },

    /// The single-image document could not be written (archive mode).
    #[error("Image {index} ('{filename}'): write failed: {detail}")]
    WriteFailed {
        index: usize,
        filename: String,
        detail: String,
    },
}
