//! Output sizing for the assembled image.
//!
//! Sizing is driven by the width. The target box is `width x height`, and a
//! zero height takes the width, so `width = 300` alone fits the image inside
//! 300x300. Without a width the image keeps its native size. Scaling goes up
//! or down. With `crop` the image fills the box and the overflow is cut
//! evenly from both sides.

use serde::{Deserialize, Serialize};

use super::{rotate_upright, EncodeError, SaveOptions};
use crate::stitch::Canvas;

/// Filter type for image resizing operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    #[default]
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// The box an image is sized into, or `None` when no width was requested.
pub fn target_box(width: u32, height: u32) -> Option<(u32, u32)> {
    match (width, height) {
        (0, _) => None,
        (w, 0) => Some((w, w)),
        (w, h) => Some((w, h)),
    }
}

/// Rotate `canvas` upright and size it per `options`.
///
/// Returns the upright canvas unchanged in size when no width was given.
pub fn resize_for_output(canvas: Canvas, options: &SaveOptions) -> Result<Canvas, EncodeError> {
    let canvas = rotate_upright(canvas)?;
    let Some((box_w, box_h)) = target_box(options.width, options.height) else {
        return Ok(canvas);
    };

    let (new_w, new_h) = if options.crop {
        fill_dimensions(canvas.width, canvas.height, box_w, box_h)
    } else {
        fit_dimensions(canvas.width, canvas.height, box_w, box_h)
    };

    let resized = resize(canvas, new_w, new_h, options.filter)?;
    if !options.crop {
        return Ok(resized);
    }

    // Centre crop the overflow of the fill
    let left = (resized.width - box_w.min(resized.width)) / 2;
    let top = (resized.height - box_h.min(resized.height)) / 2;
    let (crop_w, crop_h) = (box_w.min(resized.width), box_h.min(resized.height));
    resized
        .extract_area(left, top, crop_w, crop_h)
        .map_err(|e| EncodeError::EncodingFailed(e.to_string()))
}

/// Resize a canvas to exact dimensions.
///
/// # Errors
///
/// Returns `EncodeError::InvalidDimensions` for a zero target size.
pub fn resize(
    canvas: Canvas,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<Canvas, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    // Fast path: if dimensions match, nothing to do
    if canvas.width == width && canvas.height == height {
        return Ok(canvas);
    }

    let orientation = canvas.orientation;
    let expected = canvas.width as usize * canvas.height as usize * 3;
    let actual = canvas.pixels.len();
    let rgb_image = canvas
        .into_rgb_image()
        .ok_or(EncodeError::InvalidPixelData { expected, actual })?;

    let resized = image::imageops::resize(&rgb_image, width, height, filter.to_image_filter());
    Ok(Canvas::from_rgb_image(resized, orientation))
}

/// Largest size with the source aspect ratio that fits inside the box.
fn fit_dimensions(width: u32, height: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (box_w as f64 / width as f64).min(box_h as f64 / height as f64);
    scaled(width, height, scale)
}

/// Smallest size with the source aspect ratio that covers the box.
fn fill_dimensions(width: u32, height: u32, box_w: u32, box_h: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (box_w as f64 / width as f64).max(box_h as f64 / height as f64);
    scaled(width, height, scale)
}

fn scaled(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let w = (width as f64 * scale).round() as u32;
    let h = (height as f64 * scale).round() as u32;
    (w.max(1), h.max(1))
}
