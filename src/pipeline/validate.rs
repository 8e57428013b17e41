//! Upload validation: reject a batch before any conversion work begins.
//!
//! Rules run in a fixed order and the first violation wins, so a client
//! always gets the same error for the same batch. Validation never mutates
//! anything; the allow-set was parsed once when the config was built.

use crate::config::{ConversionConfig, MAX_FILE_BYTES};
use crate::error::UploadError;
use crate::upload::UploadItem;
use tracing::info;

/// Check a batch against count, name, extension, size and MIME constraints.
pub fn validate(items: &[UploadItem], config: &ConversionConfig) -> Result<(), UploadError> {
    if items.is_empty() {
        return Err(UploadError::EmptyBatch);
    }

    if items.len() > config.max_files {
        return Err(UploadError::TooManyFiles {
            actual: items.len(),
            limit: config.max_files,
        });
    }

    for item in items {
        validate_item(item, config)?;
    }

    info!("Validation passed: {} files", items.len());
    Ok(())
}

fn validate_item(item: &UploadItem, config: &ConversionConfig) -> Result<(), UploadError> {
    if item.bytes.is_empty() {
        return Err(UploadError::EmptyFile {
            filename: item.display_name().to_string(),
        });
    }

    let filename = match item.filename.as_deref() {
        Some(name) if !name.trim().is_empty() => name,
        _ => return Err(UploadError::InvalidFilename),
    };

    let extension = file_extension(filename).to_ascii_lowercase();
    if !config.is_extension_allowed(&extension) {
        return Err(UploadError::UnsupportedFormat {
            extension,
            allowed: config.allowed_extensions_display(),
        });
    }

    if item.size() > MAX_FILE_BYTES {
        return Err(UploadError::FileTooLarge {
            filename: filename.to_string(),
            size_bytes: item.size(),
            limit_bytes: MAX_FILE_BYTES,
        });
    }

    match item.content_type.as_deref() {
        Some(ct) if ct.starts_with("image/") => Ok(()),
        other => Err(UploadError::InvalidMimeType {
            content_type: other.unwrap_or("none").to_string(),
        }),
    }
}

/// Substring after the last `.`.
///
/// A dot in first or last position (`.hidden`, `name.`) yields an empty
/// extension, which no allow-set contains.
pub fn file_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(i) if i > 0 && i < filename.len() - 1 => &filename[i + 1..],
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConversionConfig {
        ConversionConfig::builder()
            .max_files(3)
            .allowed_extensions("jpg,jpeg,png")
            .build()
            .unwrap()
    }

    fn item(name: &str, ct: &str) -> UploadItem {
        UploadItem::new(vec![1, 2, 3], Some(name.into()), Some(ct.into()))
    }

    #[test]
    fn accepts_valid_batch() {
        let items = vec![item("a.jpg", "image/jpeg"), item("b.PNG", "image/png")];
        assert_eq!(validate(&items, &config()), Ok(()));
    }

    #[test]
    fn empty_batch() {
        assert_eq!(validate(&[], &config()), Err(UploadError::EmptyBatch));
    }

    #[test]
    fn too_many_files_reports_actual_and_limit() {
        let items = vec![item("a.jpg", "image/jpeg"); 4];
        assert_eq!(
            validate(&items, &config()),
            Err(UploadError::TooManyFiles {
                actual: 4,
                limit: 3
            })
        );
    }

    #[test]
    fn too_many_files_wins_over_per_item_errors() {
        // Item rules never run when the count check fails.
        let items = vec![UploadItem::new(Vec::new(), None, None); 5];
        assert!(matches!(
            validate(&items, &config()),
            Err(UploadError::TooManyFiles { .. })
        ));
    }

    #[test]
    fn empty_file() {
        let items = vec![UploadItem::new(
            Vec::new(),
            Some("a.jpg".into()),
            Some("image/jpeg".into()),
        )];
        assert!(matches!(
            validate(&items, &config()),
            Err(UploadError::EmptyFile { .. })
        ));
    }

    #[test]
    fn missing_or_blank_filename() {
        let missing = vec![UploadItem::new(vec![1], None, Some("image/png".into()))];
        assert_eq!(
            validate(&missing, &config()),
            Err(UploadError::InvalidFilename)
        );

        let blank = vec![item("   ", "image/png")];
        assert_eq!(
            validate(&blank, &config()),
            Err(UploadError::InvalidFilename)
        );
    }

    #[test]
    fn unsupported_extension() {
        let items = vec![item("doc.pdf", "image/png")];
        match validate(&items, &config()) {
            Err(UploadError::UnsupportedFormat { extension, allowed }) => {
                assert_eq!(extension, "pdf");
                assert_eq!(allowed, "jpeg, jpg, png");
            }
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let items = vec![item("SHOUT.JPEG", "image/jpeg")];
        assert_eq!(validate(&items, &config()), Ok(()));
    }

    #[test]
    fn no_extension_is_unsupported() {
        for name in ["noext", ".png", "trailing."] {
            let items = vec![item(name, "image/png")];
            assert!(
                matches!(
                    validate(&items, &config()),
                    Err(UploadError::UnsupportedFormat { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn file_too_large() {
        let big = UploadItem::new(
            vec![0u8; MAX_FILE_BYTES as usize + 1],
            Some("big.png".into()),
            Some("image/png".into()),
        );
        assert!(matches!(
            validate(&[big], &config()),
            Err(UploadError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn exactly_at_size_cap_is_accepted() {
        let edge = UploadItem::new(
            vec![0u8; MAX_FILE_BYTES as usize],
            Some("edge.png".into()),
            Some("image/png".into()),
        );
        assert_eq!(validate(&[edge], &config()), Ok(()));
    }

    #[test]
    fn mime_type_must_be_image() {
        let wrong = vec![item("a.png", "application/octet-stream")];
        assert_eq!(
            validate(&wrong, &config()),
            Err(UploadError::InvalidMimeType {
                content_type: "application/octet-stream".into()
            })
        );

        let missing = vec![UploadItem::new(vec![1], Some("a.png".into()), None)];
        assert!(matches!(
            validate(&missing, &config()),
            Err(UploadError::InvalidMimeType { .. })
        ));
    }

    #[test]
    fn first_failing_item_wins() {
        let items = vec![
            item("ok.png", "image/png"),
            item("bad.gif", "image/gif"),
            UploadItem::new(Vec::new(), Some("empty.png".into()), None),
        ];
        assert!(matches!(
            validate(&items, &config()),
            Err(UploadError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn validation_is_repeatable() {
        let cfg = config();
        let items = vec![item("a.jpg", "image/jpeg"), item("b.bmp", "image/bmp")];
        let first = validate(&items, &cfg);
        let second = validate(&items, &cfg);
        assert_eq!(first, second);
    }

    #[test]
    fn file_extension_rules() {
        assert_eq!(file_extension("a.b.jpg"), "jpg");
        assert_eq!(file_extension("photo.JPG"), "JPG");
        assert_eq!(file_extension(".bashrc"), "");
        assert_eq!(file_extension("name."), "");
        assert_eq!(file_extension("name"), "");
    }
}
