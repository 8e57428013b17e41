//! Document assembly: placed pages → one PDF file.
//!
//! [`PdfBuilder`] owns a `lopdf::Document` and appends one page per image,
//! in call order. The first image opens the first page; each later image
//! starts a fresh page, so a document built from N images has exactly N
//! pages and never starts with a blank one.
//!
//! Files are written atomically: the PDF is serialised into a
//! [`tempfile::NamedTempFile`] next to the destination and then persisted
//! under its final name, so a concurrent download never sees a half-written
//! document.

use super::layout::PageGeometry;
use super::page::{place, Page};
use crate::config::ConversionConfig;
use crate::error::{ImageError, Img2PdfError};
use crate::output::ImageResult;
use crate::upload::UploadItem;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Resource name of the single image drawn on each page.
const IMAGE_RESOURCE: &str = "Im0";

/// Incrementally builds a PDF with one image per page.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    geometry: PageGeometry,
}

impl PdfBuilder {
    pub fn new(geometry: PageGeometry) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            geometry,
        }
    }

    /// Pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append `page` as the next page; returns its 1-indexed page number.
    pub fn add_page(&mut self, page: &Page) -> Result<usize, lopdf::Error> {
        let image_id = self.add_image_xobject(page);

        let p = &page.placement;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        p.width.into(),
                        0.into(),
                        0.into(),
                        p.height.into(),
                        p.x.into(),
                        p.y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.as_bytes().to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let g = self.geometry;
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), g.width.into(), g.height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_RESOURCE => image_id,
                },
            },
        });
        self.kids.push(page_id.into());
        Ok(self.kids.len())
    }

    fn add_image_xobject(&mut self, page: &Page) -> ObjectId {
        let img = &page.image;
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(img.width),
            "Height" => i64::from(img.height),
            "ColorSpace" => img.color_space.pdf_name(),
            "BitsPerComponent" => 8,
            "Filter" => img.filter.pdf_name(),
        };

        if let Some(ref alpha) = img.alpha {
            let mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(img.width),
                    "Height" => i64::from(img.height),
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                alpha.clone(),
            );
            let mask_id = self.doc.add_object(mask);
            dict.set("SMask", mask_id);
        }

        self.doc.add_object(Stream::new(dict, img.data.clone()))
    }

    /// Finish the page tree and write the document to `path`.
    ///
    /// Returns the size of the written file in bytes.
    pub fn write_to(mut self, path: &Path) -> Result<u64, Img2PdfError> {
        let write_err = |source: std::io::Error| Img2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Producer" => Object::string_literal(concat!("edgequake-img2pdf ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.doc
                .save_to(&mut writer)
                .map_err(|e| write_err(std::io::Error::other(e.to_string())))?;
            writer.flush().map_err(write_err)?;
        }
        let file = tmp.persist(path).map_err(|e| write_err(e.error))?;
        let size = file.metadata().map_err(write_err)?.len();
        debug!("Wrote {} ({} pages, {} bytes)", path.display(), count, size);
        Ok(size)
    }
}

/// Decode and place one upload, tagging failures with its batch position.
pub(crate) fn place_item(item: &UploadItem, index: usize) -> Result<Page, ImageError> {
    place(&item.bytes, &PageGeometry::A4).map_err(|e| ImageError::DecodeFailed {
        index,
        filename: item.display_name().to_string(),
        detail: e.to_string(),
    })
}

/// A single-document conversion result.
#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub path: PathBuf,
    pub pages: usize,
    pub images: Vec<ImageResult>,
}

/// Combine every decodable image of `items` into one PDF under `config.temp_dir`.
///
/// An image that fails to decode or embed is logged, recorded in the
/// returned [`ImageResult`]s, and skipped; the rest of the batch continues.
///
/// # Errors
/// * [`Img2PdfError::NoImagesConverted`] when not a single image succeeded
/// * [`Img2PdfError::OutputWriteFailed`] when the PDF cannot be written
pub fn assemble(
    items: &[UploadItem],
    config: &ConversionConfig,
) -> Result<AssembledDocument, Img2PdfError> {
    let filename = format!("converted_{}.pdf", Uuid::new_v4());
    let path = config.temp_dir.join(&filename);
    let total = items.len();
    info!("Converting {} images into a single PDF ({})", total, filename);

    let mut builder = PdfBuilder::new(PageGeometry::A4);
    let mut images = Vec::with_capacity(total);

    for (i, item) in items.iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(index, total);
        }

        let outcome = place_item(item, index).and_then(|page| {
            builder
                .add_page(&page)
                .map_err(|e| ImageError::EmbedFailed {
                    index,
                    filename: item.display_name().to_string(),
                    detail: e.to_string(),
                })
        });

        match outcome {
            Ok(page_num) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_complete(index, total);
                }
                if page_num % config.progress_interval() == 0 {
                    debug!("Processed {} of {} images", page_num, total);
                }
                images.push(ImageResult {
                    index,
                    filename: item.filename.clone(),
                    page: Some(page_num),
                    entry: None,
                    error: None,
                });
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

    let pages = builder.page_count();
    if pages == 0 {
        let first_error = images
            .iter()
            .find_map(|r| r.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(Img2PdfError::NoImagesConverted { total, first_error });
    }

    builder.write_to(&path)?;
    Ok(AssembledDocument {
        path,
        pages,
        images,
    })
}
