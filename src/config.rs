//! Configuration types for image-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The allowed-extension list is parsed
//! exactly once, when the builder runs, so validation never touches shared
//! mutable state.
//!
//! HTTP-only knobs (bind address, body limit, concurrent conversions, cleanup
//! delay) live in [`ServerConfig`].

use crate::error::Img2PdfError;
use crate::progress::ProgressCallback;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default comma-separated list of accepted file extensions.
pub const DEFAULT_ALLOWED_EXTENSIONS: &str = "jpg,jpeg,png,gif,bmp,tiff";

/// Hard per-file size cap, applied on top of any transport limit.
pub const MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Name of the directory created under the system temp dir by default.
pub const DEFAULT_TEMP_DIR_NAME: &str = "image-to-pdf-temp";

/// Configuration for an image-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_img2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .temp_dir("/tmp/img2pdf")
///     .max_files(20)
///     .allowed_extensions("jpg, png")
///     .build()
///     .unwrap();
/// assert!(config.is_extension_allowed("PNG"));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory receiving every generated document and archive.
    /// Default: `$TMPDIR/image-to-pdf-temp`.
    pub temp_dir: PathBuf,

    /// Maximum number of files in one batch. Default: 100.
    pub max_files: usize,

    /// Lower-cased extensions accepted by the validator.
    pub allowed_extensions: BTreeSet<String>,

    /// Emit a `debug` progress line every `batch_size` converted images. Default: 10.
    pub batch_size: usize,

    /// Optional per-image progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            temp_dir: std::env::temp_dir().join(DEFAULT_TEMP_DIR_NAME),
            max_files: 100,
            allowed_extensions: parse_extensions(DEFAULT_ALLOWED_EXTENSIONS),
            batch_size: 10,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("temp_dir", &self.temp_dir)
            .field("max_files", &self.max_files)
            .field("allowed_extensions", &self.allowed_extensions)
            .field("batch_size", &self.batch_size)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Case-insensitive membership test against the allow-set.
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions
            .contains(&extension.to_ascii_lowercase())
    }

    /// The allow-set rendered back as a comma-separated list, for messages.
    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Successes between two progress log lines; never zero.
    pub fn progress_interval(&self) -> usize {
        self.batch_size.max(1)
    }

    /// Create the temp directory if it does not exist yet.
    pub fn ensure_temp_dir(&self) -> Result<&Path, Img2PdfError> {
        std::fs::create_dir_all(&self.temp_dir).map_err(|e| Img2PdfError::OutputWriteFailed {
            path: self.temp_dir.clone(),
            source: e,
        })?;
        Ok(&self.temp_dir)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn max_files(mut self, n: usize) -> Self {
        self.config.max_files = n;
        self
    }

    /// Replace the allow-set with the entries of a comma-separated list.
    pub fn allowed_extensions(mut self, csv: &str) -> Self {
        self.config.allowed_extensions = parse_extensions(csv);
        self
    }

    pub fn batch_size(mut self, n: usize) -> Self {
        self.config.batch_size = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Img2PdfError> {
        let c = &self.config;
        if c.max_files == 0 {
            return Err(Img2PdfError::InvalidConfig(
                "max_files must be ≥ 1".into(),
            ));
        }
        if c.allowed_extensions.is_empty() {
            return Err(Img2PdfError::InvalidConfig(
                "at least one allowed extension is required".into(),
            ));
        }
        if c.temp_dir.as_os_str().is_empty() {
            return Err(Img2PdfError::InvalidConfig(
                "temp_dir must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Split, trim and lower-case a comma-separated extension list.
pub fn parse_extensions(csv: &str) -> BTreeSet<String> {
    csv.split(',')
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP service in [`crate::server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Default: `0.0.0.0:8080`.
    pub bind: String,

    /// Maximum accepted request body in bytes. Default: 512 MiB.
    ///
    /// This is the transport limit; each file is still capped at
    /// [`MAX_FILE_BYTES`] by the validator.
    pub max_request_bytes: usize,

    /// Conversions allowed to run at the same time. Default: 8.
    pub max_concurrent_conversions: usize,

    /// Delay between a download and the deletion of its artifact. Default: 30 s.
    pub cleanup_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            max_request_bytes: 512 * 1024 * 1024,
            max_concurrent_conversions: 8,
            cleanup_delay: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_settings() {
        let c = ConversionConfig::default();
        assert_eq!(c.max_files, 100);
        assert_eq!(c.batch_size, 10);
        assert!(c.temp_dir.ends_with(DEFAULT_TEMP_DIR_NAME));
        for ext in ["jpg", "jpeg", "png", "gif", "bmp", "tiff"] {
            assert!(c.is_extension_allowed(ext), "{ext} should be allowed");
        }
        assert!(!c.is_extension_allowed("pdf"));
    }

    #[test]
    fn parse_extensions_trims_and_lowercases() {
        let set = parse_extensions(" JPG, .Png ,,gif ");
        assert_eq!(
            set.into_iter().collect::<Vec<_>>(),
            vec!["gif".to_string(), "jpg".to_string(), "png".to_string()]
        );
    }

    #[test]
    fn extension_lookup_is_case_insensitive() {
        let c = ConversionConfig::builder()
            .allowed_extensions("jpeg")
            .build()
            .unwrap();
        assert!(c.is_extension_allowed("JPEG"));
        assert!(c.is_extension_allowed("Jpeg"));
        assert!(!c.is_extension_allowed("jpg"));
    }

    #[test]
    fn build_rejects_empty_allow_set() {
        let err = ConversionConfig::builder()
            .allowed_extensions(" , ,")
            .build()
            .unwrap_err();
        assert!(matches!(err, Img2PdfError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_zero_max_files() {
        let err = ConversionConfig::builder().max_files(0).build().unwrap_err();
        assert!(err.to_string().contains("max_files"));
    }

    #[test]
    fn batch_size_is_at_least_one() {
        let c = ConversionConfig::builder().batch_size(0).build().unwrap();
        assert_eq!(c.batch_size, 1);
    }

    #[test]
    fn progress_interval_survives_zero_field() {
        let c = ConversionConfig {
            batch_size: 0,
            ..ConversionConfig::default()
        };
        assert_eq!(c.progress_interval(), 1);
    }

    #[test]
    fn ensure_temp_dir_creates_nested_dirs() {
        let root = tempfile::TempDir::new().unwrap();
        let dir = root.path().join("a/b/c");
        let c = ConversionConfig::builder().temp_dir(&dir).build().unwrap();
        c.ensure_temp_dir().unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn server_defaults() {
        let s = ServerConfig::default();
        assert_eq!(s.bind, "0.0.0.0:8080");
        assert_eq!(s.max_concurrent_conversions, 8);
        assert_eq!(s.cleanup_delay, Duration::from_secs(30));
    }
}
