//! Output formats and in-memory encoding.
//!
//! The format of a saved image is picked from the file extension. JPEG takes
//! a quality setting; PNG, TIFF and PPM are lossless and ignore it.

use std::fmt;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::codecs::tiff::TiffEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while encoding or saving an image.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 3), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The output path has no extension we can encode
    #[error("Unsupported output extension: {0:?}")]
    UnsupportedExtension(String),

    /// The encoder rejected the image
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// Writing the output file failed
    #[error("Failed to write output: {0}")]
    Io(String),
}

/// An image file format the sink can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Tiff,
    Ppm,
}

impl OutputFormat {
    /// Pick a format from a file extension, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::UnsupportedExtension` for unknown extensions.
    pub fn from_extension(ext: &str) -> Result<Self, EncodeError> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "tif" | "tiff" => Ok(OutputFormat::Tiff),
            "ppm" => Ok(OutputFormat::Ppm),
            _ => Err(EncodeError::UnsupportedExtension(ext.to_string())),
        }
    }

    /// Pick a format from the extension of `path`.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::UnsupportedExtension` if the path has no
    /// extension or an unknown one.
    pub fn from_path(path: &Path) -> Result<Self, EncodeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| EncodeError::UnsupportedExtension(String::new()))?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Ppm => "PPM",
        };
        f.write_str(name)
    }
}

fn validate(pixels: &[u8], width: u32, height: u32) -> Result<(), EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected {
        return Err(EncodeError::InvalidPixelData {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Encode RGB pixel data to JPEG bytes.
///
/// `quality` is clamped to `1..=100`.
pub fn encode_jpeg(
    pixels: &[u8],
    width: u32,
    height: u32,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    encode_image(pixels, width, height, OutputFormat::Jpeg, quality)
}

/// Encode RGB pixel data (3 bytes per pixel, row-major) in `format`.
///
/// # Errors
///
/// - `EncodeError::InvalidDimensions` if width or height is zero
/// - `EncodeError::InvalidPixelData` if the buffer length is wrong
/// - `EncodeError::EncodingFailed` if the codec fails
pub fn encode_image(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, EncodeError> {
    validate(pixels, width, height)?;

    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
            .write_image(pixels, width, height, ExtendedColorType::Rgb8),
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer).write_image(pixels, width, height, ExtendedColorType::Rgb8)
        }
        OutputFormat::Tiff => TiffEncoder::new(&mut buffer).write_image(
            pixels,
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
        OutputFormat::Ppm => PnmEncoder::new(&mut buffer)
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .write_image(pixels, width, height, ExtendedColorType::Rgb8),
    };
    result.map_err(|e| EncodeError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}


// ============================================================================
// Property-Based Tests
// ============================================================================
