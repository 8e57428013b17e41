//! Archive packaging: one single-page PDF per image, bundled into a ZIP.
//!
//! Every image is rendered on its own into `<base>_<uuid>.pdf` under the
//! temp directory. Once all images have been attempted the produced PDFs are
//! streamed into `converted_pdfs_<uuid>.zip`, entry by entry, and the
//! intermediate files are deleted. Deletion is best-effort: a file that cannot
//! be removed is logged and left behind, never reported as a failure.

use super::document::{place_item, PdfBuilder};
use super::layout::PageGeometry;
use crate::config::ConversionConfig;
use crate::error::{ImageError, Img2PdfError};
use crate::output::ImageResult;
use crate::upload::UploadItem;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// An archive-mode conversion result.
#[derive(Debug, Clone)]
pub struct PackagedArchive {
    pub path: PathBuf,
    /// Entry names, in batch order.
    pub entries: Vec<String>,
    pub images: Vec<ImageResult>,
}

/// Convert every image of `items` into its own PDF and bundle them in a ZIP.
///
/// Per-image failures are recorded and skipped. When every image fails the
/// archive is still produced, with no entries.
///
/// # Errors
/// [`Img2PdfError::ArchiveFailed`] when the ZIP cannot be written; the
/// intermediate PDFs and the partial archive are removed first.
pub fn package(
    items: &[UploadItem],
    config: &ConversionConfig,
) -> Result<PackagedArchive, Img2PdfError> {
    let zip_path = config
        .temp_dir
        .join(format!("converted_pdfs_{}.zip", Uuid::new_v4()));
    let total = items.len();
    info!("Converting {} images into individual PDFs", total);

    let mut produced: Vec<PathBuf> = Vec::with_capacity(total);
    let mut images = Vec::with_capacity(total);

    for (i, item) in items.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(index, total);
        }

        match write_single_image_pdf(item, index, &config.temp_dir) {
            Ok(pdf_path) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_complete(index, total);
                }
                images.push(ImageResult {
                    index,
                    filename: item.filename.clone(),
                    page: None,
                    entry: Some(entry_name(&pdf_path)),
                    error: None,
                });
                produced.push(pdf_path);
                if produced.len() % config.progress_interval() == 0 {
                    debug!("Processed {} of {} images", produced.len(), total);
                }
            }
            Err(e) => {
                error!("Failed to process image {}: {}", item.display_name(), e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_error(index, total, &e.to_string());
                }
                images.push(ImageResult {
                    index,
                    filename: item.filename.clone(),
                    page: None,
                    entry: None,
                    error: Some(e),
                });
            }
        }
    }

    let entries = seal(&produced, &zip_path)?;

    info!(
        "Packed {} PDFs into {}",
        entries.len(),
        zip_path.display()
    );
    Ok(PackagedArchive {
        path: zip_path,
        entries,
        images,
    })
}

/// Zip `produced` into `zip_path`, then delete the intermediates.
///
/// On failure the partial archive is removed as well.
fn seal(produced: &[PathBuf], zip_path: &Path) -> Result<Vec<String>, Img2PdfError> {
    let written = write_zip(produced, zip_path);
    remove_files(produced);

    written.map_err(|detail| {
        remove_files(&[zip_path.to_path_buf()]);
        Img2PdfError::ArchiveFailed {
            path: zip_path.to_path_buf(),
            detail,
        }
    })
}

/// Render one upload into `<dir>/<base>_<uuid>.pdf`.
fn write_single_image_pdf(
    item: &UploadItem,
    index: usize,
    dir: &Path,
) -> Result<PathBuf, ImageError> {
    let page = place_item(item, index)?;
    let fail = |kind: fn(usize, String, String) -> ImageError, detail: String| {
        kind(index, item.display_name().to_string(), detail)
    };

    let mut builder = PdfBuilder::new(PageGeometry::A4);
    builder
        .add_page(&page)
        .map_err(|e| fail(embed_failed, e.to_string()))?;

    let base = base_name(item.filename.as_deref());
    let path = dir.join(format!("{}_{}.pdf", base, Uuid::new_v4()));
    builder
        .write_to(&path)
        .map_err(|e| fail(write_failed, e.to_string()))?;
    Ok(path)
}

fn embed_failed(index: usize, filename: String, detail: String) -> ImageError {
    ImageError::EmbedFailed {
        index,
        filename,
        detail,
    }
}

fn write_failed(index: usize, filename: String, detail: String) -> ImageError {
    ImageError::WriteFailed {
        index,
        filename,
        detail,
    }
}

/// Stream every file into a fresh ZIP; returns the entry names written.
fn write_zip(files: &[PathBuf], zip_path: &Path) -> Result<Vec<String>, String> {
    let out = File::create(zip_path).map_err(|e| e.to_string())?;
    let mut zip = ZipWriter::new(BufWriter::new(out));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let name = entry_name(file);
        zip.start_file(name.as_str(), options)
            .map_err(|e| format!("{name}: {e}"))?;
        let mut reader = BufReader::new(File::open(file).map_err(|e| format!("{name}: {e}"))?);
        std::io::copy(&mut reader, &mut zip).map_err(|e| format!("{name}: {e}"))?;
        entries.push(name);
    }

    zip.finish()
        .map_err(|e| e.to_string())?
        .into_inner()
        .map_err(|e| e.to_string())?;
    debug!("ZIP archive created with {} files", entries.len());
    Ok(entries)
}

fn remove_files(files: &[PathBuf]) {
    for file in files {
        match std::fs::remove_file(file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not delete temporary file {}: {}", file.display(), e),
        }
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Declared filename reduced to a safe stem.
///
/// Directory components and the last extension are dropped; characters
/// outside `[A-Za-z0-9._-]` become `_`. Falls back to `image`.
pub fn base_name(filename: Option<&str>) -> String {
    let name = filename.unwrap_or_default();
    let name = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    };
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn jpeg_item(name: &str) -> UploadItem {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 12, Rgb([250, 200, 0])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        UploadItem::new(buf, Some(name.into()), Some("image/jpeg".into()))
    }

    fn corrupt_item(name: &str) -> UploadItem {
        UploadItem::new(vec![0xFF, 0xD8, 0x00], Some(name.into()), Some("image/jpeg".into()))
    }

    fn config_in(dir: &Path) -> ConversionConfig {
        ConversionConfig::builder().temp_dir(dir).build().unwrap()
    }

    fn dir_listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn one_entry_per_image_and_no_leftovers() {
        let dir = tempfile::TempDir::new().unwrap();
        let items = vec![jpeg_item("one.jpg"), jpeg_item("two.jpg"), jpeg_item("three.jpg")];

        let archive = package(&items, &config_in(dir.path())).unwrap();
        assert_eq!(archive.entries.len(), 3);
        assert!(archive.entries[0].starts_with("one_"));
        assert!(archive.entries[1].starts_with("two_"));
        assert!(archive.entries[2].starts_with("three_"));

        let zip = zip::ZipArchive::new(File::open(&archive.path).unwrap()).unwrap();
        assert_eq!(zip.len(), 3);

        // Only the archive itself remains in the temp dir.
        let listing = dir_listing(dir.path());
        assert_eq!(listing.len(), 1, "{listing:?}");
        assert!(listing[0].starts_with("converted_pdfs_") && listing[0].ends_with(".zip"));
    }

    #[test]
    fn failed_image_has_no_entry() {
        let dir = tempfile::TempDir::new().unwrap();
        let items = vec![jpeg_item("good.jpg"), corrupt_item("bad.jpg")];

        let archive = package(&items, &config_in(dir.path())).unwrap();
        assert_eq!(archive.entries.len(), 1);
        assert!(archive.images[0].is_success());
        assert!(!archive.images[1].is_success());
        assert_eq!(dir_listing(dir.path()).len(), 1);
    }

    #[test]
    fn all_failed_yields_empty_archive() {
        let dir = tempfile::TempDir::new().unwrap();
        let items = vec![corrupt_item("a.jpg"), corrupt_item("b.jpg")];

        let archive = package(&items, &config_in(dir.path())).unwrap();
        assert!(archive.entries.is_empty());
        let zip = zip::ZipArchive::new(File::open(&archive.path).unwrap()).unwrap();
        assert_eq!(zip.len(), 0);
    }

    #[test]
    fn entries_are_valid_single_page_pdfs() {
        let dir = tempfile::TempDir::new().unwrap();
        let archive = package(&[jpeg_item("pic.jpg")], &config_in(dir.path())).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&archive.path).unwrap()).unwrap();
        let mut entry = zip.by_index(0).unwrap();
        let mut bytes = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut bytes).unwrap();
        let pdf = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(pdf.get_pages().len(), 1);
    }

    #[test]
    fn unwritable_temp_dir_fails_the_archive() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("does-not-exist");
        let err = package(&[jpeg_item("a.jpg")], &config_in(&missing)).unwrap_err();
        assert!(matches!(err, Img2PdfError::ArchiveFailed { .. }));
    }

    #[test]
    fn intermediate_lost_mid_archive_removes_everything() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = write_single_image_pdf(&jpeg_item("a.jpg"), 1, dir.path()).unwrap();
        let second = write_single_image_pdf(&jpeg_item("b.jpg"), 2, dir.path()).unwrap();
        // The first entry is written before the second source turns out to be gone.
        std::fs::remove_file(&second).unwrap();

        let zip_path = dir.path().join("converted_pdfs_test.zip");
        let err = seal(&[first.clone(), second], &zip_path).unwrap_err();

        match err {
            Img2PdfError::ArchiveFailed { path, detail } => {
                assert_eq!(path, zip_path);
                assert!(detail.starts_with("b_"), "{detail}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!first.exists());
        assert!(!zip_path.exists());
        assert!(dir_listing(dir.path()).is_empty());
    }

    #[test]
    fn base_name_rules() {
        assert_eq!(base_name(Some("photo.jpg")), "photo");
        assert_eq!(base_name(Some("my.holiday.png")), "my.holiday");
        assert_eq!(base_name(Some("../../etc/passwd.png")), "passwd");
        assert_eq!(base_name(Some("C:\\Users\\x\\scan 01.tiff")), "scan_01");
        assert_eq!(base_name(Some("noext")), "noext");
        assert_eq!(base_name(Some(".png")), "png");
        assert_eq!(base_name(Some("")), "image");
        assert_eq!(base_name(None), "image");
    }
}
