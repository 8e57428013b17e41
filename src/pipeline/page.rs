//! Page composition: one image in, one placed page out.

use super::encode::{encode_image, EncodedImage};
use super::layout::{PageGeometry, Placement};
use tracing::debug;

/// A decoded image and where it sits on its page.
#[derive(Debug, Clone)]
pub struct Page {
    pub image: EncodedImage,
    pub placement: Placement,
}

/// Decode `bytes`, fit the image to `geometry`, and prepare it for embedding.
///
/// Side-effect free apart from logging; fails only when the bytes cannot be
/// decoded or re-encoded.
pub fn place(bytes: &[u8], geometry: &PageGeometry) -> Result<Page, image::ImageError> {
    let decoded = image::load_from_memory(bytes)?;
    let placement = geometry.fit(decoded.width(), decoded.height());
    debug!(
        "Placed {}x{} px image at {:.1}x{:.1} pt (scale {:.3})",
        decoded.width(),
        decoded.height(),
        placement.width,
        placement.height,
        placement.scale
    );
    let image = encode_image(bytes, &decoded)?;
    Ok(Page { image, placement })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([0, 128, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn places_decodable_image() {
        let page = place(&png(200, 100), &PageGeometry::A4).unwrap();
        assert_eq!((page.image.width, page.image.height), (200, 100));
        assert!((page.placement.width / page.placement.height - 2.0).abs() < 1e-4);
    }

    #[test]
    fn rejects_garbage() {
        assert!(place(b"definitely not an image", &PageGeometry::A4).is_err());
    }

    #[test]
    fn rejects_truncated_png() {
        let bytes = png(50, 50);
        assert!(place(&bytes[..bytes.len() / 3], &PageGeometry::A4).is_err());
    }
}
