//! API response types

use crate::output::ConversionOutput;
use serde::{Deserialize, Serialize};

/// Route prefix under which generated artifacts are served.
pub const DOWNLOAD_PREFIX: &str = "/api/convert/download/";

/// Body of every `POST /api/convert` response, success or failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_images: Option<usize>,
    /// Images that actually made it into the artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_images: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

impl ConversionResponse {
    pub fn success(output: &ConversionOutput, processing_time_ms: u64) -> Self {
        let filename = output.artifact.filename.clone();
        Self {
            success: true,
            message: "Conversion completed successfully".to_string(),
            download_url: Some(format!("{DOWNLOAD_PREFIX}{filename}")),
            filename: Some(filename),
            total_images: Some(output.stats.total_images),
            processed_images: Some(output.stats.processed_images),
            processing_time_ms: Some(processing_time_ms),
            error_details: None,
        }
    }

    pub fn failure(details: impl Into<String>) -> Self {
        Self {
            success: false,
            message: "Conversion failed".to_string(),
            error_details: Some(details.into()),
            ..Self::default()
        }
    }
}

/// Upload limits advertised on `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub max_files: usize,
    /// Upper-cased, comma-separated, e.g. `"BMP, GIF, JPEG"`.
    pub allowed_formats: String,
    pub max_file_size_mb: u64,
    pub conversion_types: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// API version
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_omits_success_fields() {
        let json = serde_json::to_value(ConversionResponse::failure("No files provided")).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "Conversion failed");
        assert_eq!(json["errorDetails"], "No files provided");
        assert!(json.get("downloadUrl").is_none());
        assert!(json.get("totalImages").is_none());
    }

    #[test]
    fn service_info_keys() {
        let info = ServiceInfo {
            max_files: 100,
            allowed_formats: "JPG, PNG".into(),
            max_file_size_mb: 50,
            conversion_types: vec!["SINGLE_PDF".into()],
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["maxFiles"], 100);
        assert_eq!(json["allowedFormats"], "JPG, PNG");
        assert_eq!(json["maxFileSizeMb"], 50);
        assert_eq!(json["conversionTypes"][0], "SINGLE_PDF");
    }

    #[test]
    fn keys_are_camel_case() {
        let resp = ConversionResponse {
            success: true,
            message: "ok".into(),
            download_url: Some("/api/convert/download/x.pdf".into()),
            filename: Some("x.pdf".into()),
            total_images: Some(2),
            processed_images: Some(1),
            processing_time_ms: Some(12),
            error_details: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        for key in [
            "downloadUrl",
            "filename",
            "totalImages",
            "processedImages",
            "processingTimeMs",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert!(json.get("errorDetails").is_none());
    }
}
