//! HTTP request handlers for API endpoints

use axum::{
    body::{Body, Bytes},
    extract::{multipart::MultipartRejection, Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::io::ErrorKind;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{error, info, warn};

use super::types::{ConversionResponse, HealthResponse, ServiceInfo};
use super::AppState;
use crate::config::MAX_FILE_BYTES;
use crate::convert::convert;
use crate::error::{Img2PdfError, UploadError};
use crate::output::ArtifactKind;
use crate::upload::{ConversionMode, ConversionRequest, UploadItem};

type ApiError = (StatusCode, Json<ConversionResponse>);

/// Read size for streamed downloads.
const DOWNLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Upload limits for clients building the form.
pub async fn service_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(ServiceInfo {
        max_files: state.config.max_files,
        allowed_formats: state.config.allowed_extensions_display().to_uppercase(),
        max_file_size_mb: MAX_FILE_BYTES / (1024 * 1024),
        conversion_types: [ConversionMode::SinglePdf, ConversionMode::MultiplePdfsZip]
            .iter()
            .map(|m| m.as_str().to_string())
            .collect(),
    })
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Convert an uploaded image batch.
///
/// Expects `multipart/form-data` with one or more `files` parts and a
/// `conversionType` text part. Responds 200 with the download location,
/// 400 for a rejected batch, and 500 when conversion fails.
pub async fn convert_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ConversionResponse>, ApiError> {
    let start = Instant::now();

    let request = read_request(multipart).await.map_err(|e| {
        warn!("Rejected upload: {}", e);
        error_response(&Img2PdfError::from(e))
    })?;
    info!(
        "Received conversion request: {} files, mode {}",
        request.items.len(),
        request.mode
    );

    let _permit = state
        .permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| error_response(&Img2PdfError::Internal(e.to_string())))?;

    let output = convert(request, &state.config).await.map_err(|e| {
        if e.is_client_error() {
            warn!("Validation error: {}", e);
        } else {
            error!("Conversion error: {}", e);
        }
        error_response(&e)
    })?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ConversionResponse::success(&output, elapsed)))
}

/// Stream a generated artifact and schedule its deletion.
///
/// The body is read in fixed-size chunks, so memory per download stays
/// bounded regardless of the artifact size.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    if !is_servable_name(&filename) {
        warn!("Refusing download of suspicious name: {:?}", filename);
        return Err(StatusCode::NOT_FOUND);
    }

    let path = state.config.temp_dir.join(&filename);
    let open_failed = |e: std::io::Error| {
        if e.kind() == ErrorKind::NotFound {
            error!("File not found: {}", filename);
            StatusCode::NOT_FOUND
        } else {
            error!("Download of {} failed: {}", filename, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let file = File::open(&path).await.map_err(open_failed)?;
    let size = file.metadata().await.map_err(open_failed)?.len();

    info!("Download started: {} ({} bytes)", filename, size);
    state.janitor.schedule(path);

    let content_type = ArtifactKind::from_filename(&filename).content_type();
    let disposition = format!("attachment; filename=\"{}\"", filename);
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(file_chunks(file)),
    ))
}

fn file_chunks(
    file: File,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    futures::stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_BYTES];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok::<_, std::io::Error>(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), file)))
    })
}

/// Collect `files` and `conversionType` from the multipart body.
async fn read_request(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ConversionRequest, UploadError> {
    let mut multipart = multipart.map_err(|e| UploadError::MalformedUpload(e.body_text()))?;
    let mut items = Vec::new();
    let mut mode = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::MalformedUpload(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "files[]" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| UploadError::MalformedUpload(e.body_text()))?;
                items.push(UploadItem::new(bytes.to_vec(), filename, content_type));
            }
            "conversionType" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| UploadError::MalformedUpload(e.body_text()))?;
                mode = Some(text.trim().parse::<ConversionMode>()?);
            }
            _ => {}
        }
    }

    let mode = mode.ok_or_else(|| UploadError::UnknownConversionType(String::new()))?;
    Ok(ConversionRequest::new(items, mode))
}

fn error_response(e: &Img2PdfError) -> ApiError {
    if e.is_client_error() {
        (
            StatusCode::BAD_REQUEST,
            Json(ConversionResponse::failure(e.to_string())),
        )
    } else if e.is_conversion_error() {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ConversionResponse::failure(e.to_string())),
        )
    } else {
        error!("Unexpected error: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ConversionResponse::failure("Unexpected error")),
        )
    }
}

/// A bare filename inside the temp directory: no separators, no `..`, not hidden.
fn is_servable_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
}
