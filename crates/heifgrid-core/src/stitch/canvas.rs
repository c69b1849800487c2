//! The pixel surface tiles are composited onto.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner
//! - Coordinates and sizes are in whole pixels
//! - Pixels are interleaved RGB, 3 bytes each, rows top to bottom

use crate::decode::{DecodedTile, GridError, Orientation};

/// An RGB image plus an optional orientation tag.
///
/// The orientation is metadata only: pixel rows are stored as decoded and
/// rotation is left to whoever displays or saves the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
    pub orientation: Option<Orientation>,
}

impl Canvas {
    /// A black canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; width as usize * height as usize * 3],
            orientation: None,
        }
    }

    /// Wrap an already decoded tile, e.g. a thumbnail, as a canvas.
    pub fn from_tile(tile: DecodedTile) -> Self {
        Self {
            width: tile.width,
            height: tile.height,
            pixels: tile.pixels,
            orientation: None,
        }
    }

    #[inline]
    fn row_bytes(&self) -> usize {
        self.width as usize * 3
    }

    /// RGB value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = y as usize * self.row_bytes() + x as usize * 3;
        [self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]]
    }

    /// Copy `tile` so its top-left corner lands on `(x, y)`.
    ///
    /// Parts of the tile falling outside the canvas are dropped.
    pub fn blit(&mut self, tile: &DecodedTile, x: u32, y: u32) {
        let copy_width = tile.width.min(self.width.saturating_sub(x)) as usize;
        let copy_height = tile.height.min(self.height.saturating_sub(y)) as usize;

        if copy_width == 0 || copy_height == 0 {
            return;
        }

        let src_stride = tile.width as usize * 3;
        let dst_stride = self.row_bytes();
        let dst_x = x as usize * 3;

        for row in 0..copy_height {
            let src_start = row * src_stride;
            let dst_start = (y as usize + row) * dst_stride + dst_x;

            self.pixels[dst_start..dst_start + copy_width * 3]
                .copy_from_slice(&tile.pixels[src_start..src_start + copy_width * 3]);
        }
    }

    /// Keep only the rectangle at `(left, top)` of size `width x height`.
    ///
    /// # Errors
    ///
    /// Returns `GridError::InvalidDimensions` if the rectangle is empty or
    /// does not fit inside the canvas.
    pub fn extract_area(
        self,
        left: u32,
        top: u32,
        width: u32,
        height: u32,
    ) -> Result<Canvas, GridError> {
        let fits = left.checked_add(width).is_some_and(|r| r <= self.width)
            && top.checked_add(height).is_some_and(|b| b <= self.height);
        if width == 0 || height == 0 || !fits {
            return Err(GridError::InvalidDimensions { width, height });
        }

        // Fast path: nothing to cut away
        if left == 0 && top == 0 && width == self.width && height == self.height {
            return Ok(self);
        }

        let out_stride = width as usize * 3;
        let mut output = Vec::with_capacity(out_stride * height as usize);

        // Copy pixel data row by row
        for y in top..top + height {
            let start = y as usize * self.row_bytes() + left as usize * 3;
            output.extend_from_slice(&self.pixels[start..start + out_stride]);
        }

        Ok(Canvas {
            width,
            height,
            pixels: output,
            orientation: self.orientation,
        })
    }

    /// Convert to an image::RgbImage for encoding or resizing.
    pub fn into_rgb_image(self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels)
    }

    /// Rebuild a canvas from an image::RgbImage, keeping `orientation`.
    pub fn from_rgb_image(img: image::RgbImage, orientation: Option<Orientation>) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
            orientation,
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
