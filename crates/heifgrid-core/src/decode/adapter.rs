//! Tile decode adapter.
//!
//! Wraps one call into the external tile decoder and normalizes whatever
//! frame layout it returns into interleaved, top-to-bottom RGB. The decode
//! algorithm itself belongs to the decoder; this module only owns the pixel
//! layout, the colorspace conversion and the lifetime of the output buffer.

use super::color::ColorConverter;
use super::{CodecError, DecodedTile, GridError, PixelLayout, RawFrame};

/// External bitstream decoder for a single compressed tile.
///
/// Implementations are called from several threads at once in parallel mode,
/// so any codec context must be created per call or be internally
/// thread-safe.
pub trait TileDecoder: Send + Sync {
    /// Decode compressed bytes (already prefixed with decoder parameters)
    /// into one raw frame.
    fn decode(&self, data: &[u8]) -> Result<RawFrame, CodecError>;
}

impl<F> TileDecoder for F
where
    F: Fn(&[u8]) -> Result<RawFrame, CodecError> + Send + Sync,
{
    fn decode(&self, data: &[u8]) -> Result<RawFrame, CodecError> {
        self(data)
    }
}

/// Decode one tile and normalize it to RGB.
///
/// # Errors
///
/// - `GridError::TileDecodeFailed` when the decoder rejects the data
/// - `GridError::InvalidFrame` when the returned planes do not match the
///   declared layout
pub fn decode_tile(
    decoder: &dyn TileDecoder,
    tile_index: usize,
    data: &[u8],
    converter: ColorConverter,
) -> Result<DecodedTile, GridError> {
    let frame = decoder
        .decode(data)
        .map_err(|source| GridError::TileDecodeFailed {
            index: tile_index,
            source,
        })?;

    let pixels = frame_to_rgb(&frame, converter)?;
    Ok(DecodedTile::new(tile_index, frame.width, frame.height, pixels))
}

/// Convert a raw frame into a buffer of exactly `width * height * 3` bytes.
pub fn frame_to_rgb(frame: &RawFrame, converter: ColorConverter) -> Result<Vec<u8>, GridError> {
    validate_frame(frame)?;

    let width = frame.width as usize;
    let height = frame.height as usize;
    let mut output = vec![0u8; width * height * 3];

    match frame.layout {
        PixelLayout::Rgb => {
            let plane = &frame.planes[0];
            for (y, dst) in output.chunks_exact_mut(width * 3).enumerate() {
                dst.copy_from_slice(plane.row(y, width * 3));
            }
        }
        PixelLayout::Gray => {
            let plane = &frame.planes[0];
            for (y, dst) in output.chunks_exact_mut(width * 3).enumerate() {
                let src = plane.row(y, width);
                for (px, &luma) in dst.chunks_exact_mut(3).zip(src) {
                    px.copy_from_slice(&converter.gray_to_rgb(luma));
                }
            }
        }
        PixelLayout::Yuv420 | PixelLayout::Yuv422 | PixelLayout::Yuv444 => {
            let (sub_x, sub_y) = frame.layout.chroma_subsampling();
            let (sub_x, sub_y) = (sub_x as usize, sub_y as usize);
            let chroma_width = width.div_ceil(sub_x);
            let coeffs = converter.coefficients();
            let (luma, cb, cr) = (&frame.planes[0], &frame.planes[1], &frame.planes[2]);

            for (y, dst) in output.chunks_exact_mut(width * 3).enumerate() {
                let y_row = luma.row(y, width);
                let cb_row = cb.row(y / sub_y, chroma_width);
                let cr_row = cr.row(y / sub_y, chroma_width);

                for (x, px) in dst.chunks_exact_mut(3).enumerate() {
                    let c = x / sub_x;
                    px.copy_from_slice(&coeffs.apply(y_row[x], cb_row[c], cr_row[c]));
                }
            }
        }
    }

    Ok(output)
}

/// Check that every plane holds enough rows for the declared dimensions.
fn validate_frame(frame: &RawFrame) -> Result<(), GridError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(GridError::InvalidFrame(format!(
            "empty frame {}x{}",
            frame.width, frame.height
        )));
    }

    let expected_planes = frame.layout.plane_count();
    if frame.planes.len() != expected_planes {
        return Err(GridError::InvalidFrame(format!(
            "{:?} frame needs {} planes, got {}",
            frame.layout,
            expected_planes,
            frame.planes.len()
        )));
    }

    let width = frame.width as usize;
    let height = frame.height as usize;
    let (sub_x, sub_y) = frame.layout.chroma_subsampling();

    for (i, plane) in frame.planes.iter().enumerate() {
        let (row_len, rows) = match (frame.layout, i) {
            (PixelLayout::Rgb, _) => (width * 3, height),
            (_, 0) => (width, height),
            _ => (
                width.div_ceil(sub_x as usize),
                height.div_ceil(sub_y as usize),
            ),
        };

        if plane.stride < row_len {
            return Err(GridError::InvalidFrame(format!(
                "plane {} stride {} is shorter than a row of {} bytes",
                i, plane.stride, row_len
            )));
        }

        // The last row does not need trailing stride padding.
        let needed = plane
            .stride
            .checked_mul(rows - 1)
            .and_then(|n| n.checked_add(row_len))
            .ok_or_else(|| {
                GridError::InvalidFrame(format!(
                    "plane {} stride {} overflows for {} rows",
                    i, plane.stride, rows
                ))
            })?;
        if plane.data.len() < needed {
            return Err(GridError::InvalidFrame(format!(
                "plane {} holds {} bytes, needs {}",
                i,
                plane.data.len(),
                needed
            )));
        }
    }

    Ok(())
}
