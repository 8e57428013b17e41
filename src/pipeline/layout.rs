//! Page geometry and scale-to-fit placement.
//!
//! Pure arithmetic, no I/O: given an image's intrinsic pixel size, compute
//! where it lands on the page. Units are PDF points (1/72 inch).

use serde::{Deserialize, Serialize};

/// Fixed page size plus a uniform margin on every side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// ISO A4 portrait with a 36 pt margin per side.
    pub const A4: PageGeometry = PageGeometry {
        width: 595.0,
        height: 842.0,
        margin: 36.0,
    };

    /// Width left once both side margins are removed.
    pub fn available_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Height left once top and bottom margins are removed.
    pub fn available_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }

    /// Place an image of `image_width × image_height` pixels on this page.
    ///
    /// The scale is uniform (aspect ratio preserved) and may exceed 1 for
    /// images smaller than the usable area. The result is centred
    /// horizontally and aligned to the top margin.
    pub fn fit(&self, image_width: u32, image_height: u32) -> Placement {
        let iw = image_width.max(1) as f32;
        let ih = image_height.max(1) as f32;

        let scale = (self.available_width() / iw).min(self.available_height() / ih);
        let width = iw * scale;
        let height = ih * scale;

        Placement {
            scale,
            width,
            height,
            x: (self.width - width) / 2.0,
            // PDF origin is bottom-left.
            y: self.height - self.margin - height,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Where and how large an image is drawn on its page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub scale: f32,
    pub width: f32,
    pub height: f32,
    /// Left edge, in points from the page's left side.
    pub x: f32,
    /// Bottom edge, in points from the page's bottom side.
    pub y: f32,
}
