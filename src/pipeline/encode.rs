//! Image encoding: decoded pixels → a payload a PDF image XObject can carry.
//!
//! Baseline JPEG files with one or three colour components are embedded
//! byte-for-byte (`DCTDecode`), which keeps photos at their original size and
//! quality. Everything else is flattened to 8-bit Gray or RGB and
//! zlib-compressed (`FlateDecode`); an alpha channel, when present and not
//! fully opaque, travels as a separate soft mask.

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, DynamicImage, ImageFormat};
use std::io::Write;
use tracing::debug;

/// Stream filter of the encoded pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// Original JPEG bytes.
    Dct,
    /// zlib-compressed raw samples.
    Flate,
}

impl ImageFilter {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ImageFilter::Dct => "DCTDecode",
            ImageFilter::Flate => "FlateDecode",
        }
    }
}

/// PDF device colour space of the samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
}

impl ColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
        }
    }
}

/// Pixel payload ready for an image XObject.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub filter: ImageFilter,
    pub data: Vec<u8>,
    /// zlib-compressed 8-bit alpha samples, `None` when fully opaque.
    pub alpha: Option<Vec<u8>>,
}

/// Encode a decoded image for embedding.
///
/// `bytes` are the original file contents; they are reused verbatim when
/// the source is a JPEG the PDF reader can consume directly.
pub fn encode_image(bytes: &[u8], img: &DynamicImage) -> Result<EncodedImage, image::ImageError> {
    let (width, height) = (img.width(), img.height());

    if let Some(color_space) = jpeg_passthrough(bytes, img) {
        debug!("Embedding {}x{} JPEG as-is ({} bytes)", width, height, bytes.len());
        return Ok(EncodedImage {
            width,
            height,
            color_space,
            filter: ImageFilter::Dct,
            data: bytes.to_vec(),
            alpha: None,
        });
    }

    let (samples, color_space) = if is_grayscale(img.color()) {
        (img.to_luma8().into_raw(), ColorSpace::Gray)
    } else {
        (img.to_rgb8().into_raw(), ColorSpace::Rgb)
    };

    let alpha = if img.color().has_alpha() {
        let mask: Vec<u8> = img.to_rgba8().pixels().map(|p| p.0[3]).collect();
        if mask.iter().all(|&a| a == u8::MAX) {
            None
        } else {
            Some(zlib(&mask)?)
        }
    } else {
        None
    };

    let data = zlib(&samples)?;
    debug!(
        "Encoded {}x{} image → {} bytes Flate{}",
        width,
        height,
        data.len(),
        if alpha.is_some() { " + soft mask" } else { "" }
    );

    Ok(EncodedImage {
        width,
        height,
        color_space,
        filter: ImageFilter::Flate,
        data,
        alpha,
    })
}

fn is_grayscale(color: ColorType) -> bool {
    matches!(
        color,
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16
    )
}

/// Colour space to declare when the original JPEG bytes can be embedded.
fn jpeg_passthrough(bytes: &[u8], img: &DynamicImage) -> Option<ColorSpace> {
    if image::guess_format(bytes).ok()? != ImageFormat::Jpeg {
        return None;
    }
    // CMYK/YCCK JPEGs decode to RGB but carry four components; re-encode those.
    match (jpeg_components(bytes)?, img.color()) {
        (1, ColorType::L8) => Some(ColorSpace::Gray),
        (3, ColorType::Rgb8) => Some(ColorSpace::Rgb),
        _ => None,
    }
}

/// Number of colour components declared by the first SOFn segment.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    let mut i = 2; // skip SOI
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        if marker == 0xFF {
            // fill byte
            i += 1;
            continue;
        }
        let len = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        let is_sof = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            return bytes.get(i + 9).copied();
        }
        if marker == 0xDA {
            return None;
        }
        i += 2 + len;
    }
    None
}

fn zlib(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    enc.write_all(data)?;
    enc.finish()
}
