//! Conversion entry points.
//!
//! [`convert_blocking`] runs the whole pipeline on the calling thread: decode
//! and PDF serialisation are CPU-bound and use synchronous file I/O. The async
//! [`convert`] moves that work onto tokio's blocking pool so request handlers
//! never stall the runtime's worker threads.

use crate::config::ConversionConfig;
use crate::error::Img2PdfError;
use crate::output::{ArtifactKind, ConversionOutput, ConversionStats, OutputArtifact};
use crate::pipeline::{archive, document, validate};
use crate::upload::{ConversionMode, ConversionRequest};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Convert a batch of images to a PDF or a ZIP of PDFs.
///
/// This is the primary async entry point for the library.
///
/// # Returns
/// `Ok(ConversionOutput)` on success, even if some images failed
/// (check `output.stats.failed_images`).
///
/// # Errors
/// Returns `Err(Img2PdfError)` only for fatal errors:
/// - The batch fails validation
/// - No image could be converted in single-document mode
/// - The PDF or ZIP could not be written
/// - Assembly panicked ([`Img2PdfError::Conversion`])
pub async fn convert(
    request: ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Img2PdfError> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || convert_blocking(&request, &config))
        .await
        .map_err(join_error)?
}

/// A panic while assembling is a failed conversion; a cancelled task is not.
fn join_error(e: tokio::task::JoinError) -> Img2PdfError {
    if !e.is_panic() {
        return Img2PdfError::Internal(format!("Conversion task failed: {}", e));
    }
    let payload = e.into_panic();
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "conversion task panicked".to_string());
    Img2PdfError::Conversion { detail }
}

/// Synchronous pipeline behind [`convert`].
///
/// Safe to call from any non-async context. Inside a tokio runtime prefer
/// [`convert`].
pub fn convert_blocking(
    request: &ConversionRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Img2PdfError> {
    let start = Instant::now();
    let total = request.items.len();
    info!(
        "Starting conversion: {} files, mode {}",
        total, request.mode
    );

    // ── Step 1: Validate the batch ───────────────────────────────────────
    validate(&request.items, config)?;

    // ── Step 2: Make sure the output directory exists ────────────────────
    config.ensure_temp_dir()?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    // ── Step 3: Run the selected pipeline ────────────────────────────────
    let (path, kind, images) = match request.mode {
        ConversionMode::SinglePdf => {
            let doc = document::assemble(&request.items, config)?;
            (doc.path, ArtifactKind::Pdf, doc.images)
        }
        ConversionMode::MultiplePdfsZip => {
            let zip = archive::package(&request.items, config)?;
            (zip.path, ArtifactKind::Zip, zip.images)
        }
    };

    // ── Step 4: Describe the artifact and compute stats ──────────────────
    let artifact = describe(path, kind)?;
    let processed = images.iter().filter(|r| r.is_success()).count();
    let stats = ConversionStats {
        total_images: total,
        processed_images: processed,
        failed_images: total - processed,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total, processed);
    }

    info!(
        "Conversion complete: {}/{} images in {}ms → {} ({} bytes)",
        processed, total, stats.duration_ms, artifact.filename, artifact.size_bytes
    );

    Ok(ConversionOutput {
        artifact,
        images,
        stats,
    })
}

fn describe(path: PathBuf, kind: ArtifactKind) -> Result<OutputArtifact, Img2PdfError> {
    OutputArtifact::from_path(path.clone(), kind)
        .map_err(|source| Img2PdfError::OutputWriteFailed { path, source })
}
