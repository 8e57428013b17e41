//! # edgequake-img2pdf
//!
//! Convert batches of images (JPEG, PNG, GIF, BMP, TIFF) into PDF documents,
//! either one combined document or a ZIP archive with one PDF per image.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload batch
//!  │
//!  ├─ 1. Validate  count, size, extension and MIME checks (first failure wins)
//!  ├─ 2. Decode    image crate, one item at a time (spawn_blocking)
//!  ├─ 3. Layout    scale-to-fit on A4 with 36 pt margins, aspect ratio kept
//!  ├─ 4. Embed     JPEG passthrough or Flate + soft mask via lopdf
//!  └─ 5. Output    converted_<uuid>.pdf  or  converted_pdfs_<uuid>.zip
//! ```
//!
//! A corrupt image never aborts the batch: it is logged, reported in
//! [`ConversionOutput::images`], and skipped.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_img2pdf::{convert, ConversionConfig, ConversionMode, ConversionRequest, UploadItem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let items = vec![
//!         UploadItem::from_path("scan-1.jpg")?,
//!         UploadItem::from_path("scan-2.png")?,
//!     ];
//!     let request = ConversionRequest::new(items, ConversionMode::SinglePdf);
//!     let output = convert(request, &config).await?;
//!     println!("{} ({} bytes)", output.artifact.path.display(), output.artifact.size_bytes);
//!     eprintln!("{}/{} images converted",
//!         output.stats.processed_images,
//!         output.stats.total_images);
//!     Ok(())
//! }
//! ```
//!
//! ## HTTP Service
//!
//! [`server::build_router`] exposes the pipeline as `POST /api/convert`
//! (multipart `files` + `conversionType`) and
//! `GET /api/convert/download/{filename}`; `GET /` reports the upload limits.
//! Downloaded artifacts are removed
//! by the [`ArtifactJanitor`] after a grace period.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `img2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-img2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod cleanup;
pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;
pub mod upload;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use cleanup::ArtifactJanitor;
pub use config::{ConversionConfig, ConversionConfigBuilder, ServerConfig, MAX_FILE_BYTES};
pub use convert::{convert, convert_blocking};
pub use error::{ImageError, Img2PdfError, UploadError};
pub use output::{ArtifactKind, ConversionOutput, ConversionStats, ImageResult, OutputArtifact};
pub use pipeline::layout::{PageGeometry, Placement};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{build_router, serve, start_server, AppState};
pub use upload::{ConversionMode, ConversionRequest, UploadItem};
