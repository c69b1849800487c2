//! Writing the assembled image to disk.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use super::{encode_image, resize_for_output, EncodeError, FilterType, OutputFormat};
use crate::decode::Orientation;
use crate::stitch::Canvas;

/// Default JPEG quality for saved images.
pub const DEFAULT_QUALITY: u8 = 90;

/// How a canvas is sized and encoded when saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOptions {
    /// JPEG quality, 1-100. Ignored by lossless formats.
    pub quality: u8,
    /// Target width in pixels; 0 means unconstrained.
    pub width: u32,
    /// Target height in pixels; 0 means unconstrained.
    pub height: u32,
    /// Fill the target box and crop the overflow instead of fitting inside it.
    pub crop: bool,
    pub filter: FilterType,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            width: 0,
            height: 0,
            crop: false,
            filter: FilterType::default(),
        }
    }
}

/// Apply the canvas's orientation tag to its pixels.
///
/// The returned canvas is tagged `Normal` when a tag was present, and stays
/// untagged otherwise.
pub fn rotate_upright(canvas: Canvas) -> Result<Canvas, EncodeError> {
    let Some(orientation) = canvas.orientation else {
        return Ok(canvas);
    };
    if orientation == Orientation::Normal {
        return Ok(canvas);
    }

    let expected = canvas.width as usize * canvas.height as usize * 3;
    let actual = canvas.pixels.len();
    let img = canvas
        .into_rgb_image()
        .map(DynamicImage::ImageRgb8)
        .ok_or(EncodeError::InvalidPixelData { expected, actual })?;

    let upright = match orientation {
        Orientation::Normal => img,
        Orientation::FlipHorizontal => img.fliph(),
        Orientation::Rotate180 => img.rotate180(),
        Orientation::FlipVertical => img.flipv(),
        Orientation::Transpose => img.rotate90().fliph(),
        Orientation::Rotate90CW => img.rotate90(),
        Orientation::Transverse => img.rotate270().fliph(),
        Orientation::Rotate270CW => img.rotate270(),
    };

    Ok(Canvas::from_rgb_image(
        upright.into_rgb8(),
        Some(Orientation::Normal),
    ))
}

/// Save `canvas` to `path`, choosing the format from the extension.
///
/// The image is rotated upright and sized per `options` before encoding.
///
/// # Errors
///
/// - `EncodeError::UnsupportedExtension` for an unknown extension
/// - `EncodeError::EncodingFailed` if encoding fails
/// - `EncodeError::Io` if the file cannot be written
pub fn save(canvas: Canvas, path: &Path, options: &SaveOptions) -> Result<(), EncodeError> {
    let format = OutputFormat::from_path(path)?;
    let start = Instant::now();

    let canvas = resize_for_output(canvas, options)?;
    let bytes = encode_image(
        &canvas.pixels,
        canvas.width,
        canvas.height,
        format,
        options.quality,
    )?;
    std::fs::write(path, &bytes).map_err(|e| EncodeError::Io(format!("{}: {}", path.display(), e)))?;

    log::info!(
        "Exported {}x{} {} ({} bytes) to {} in {} ms",
        canvas.width,
        canvas.height,
        format,
        bytes.len(),
        path.display(),
        start.elapsed().as_millis()
    );
    Ok(())
}
