//! EXIF orientation extraction and tagging.
//!
//! The metadata item of a grid is an EXIF block behind a small header: a
//! 4-byte big-endian offset to the TIFF header, usually followed by the
//! `Exif\0\0` marker. Only the primary-IFD orientation is read; everything
//! else in the block is ignored.
//!
//! Orientation is attached to the canvas as a tag. Pixels are never rotated
//! here.

use exif::{In, Reader, Tag};

use crate::decode::{GridError, Orientation};
use crate::stitch::Canvas;

const EXIF_MARKER: &[u8] = b"Exif\0\0";
const TIFF_MAGIC_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00]; // II + 42
const TIFF_MAGIC_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A]; // MM + 42

#[inline]
fn is_tiff_header(data: &[u8]) -> bool {
    data.len() >= 4 && (data[..4] == TIFF_MAGIC_LE || data[..4] == TIFF_MAGIC_BE)
}

/// Find where the TIFF structure starts inside a metadata item payload.
fn find_tiff_start(payload: &[u8]) -> Option<usize> {
    if let Some(pos) = payload
        .windows(EXIF_MARKER.len())
        .position(|w| w == EXIF_MARKER)
    {
        let start = pos + EXIF_MARKER.len();
        if is_tiff_header(&payload[start..]) {
            return Some(start);
        }
    }

    // No marker: trust the offset prefix
    let prefix: [u8; 4] = payload.get(..4)?.try_into().ok()?;
    let start = (u32::from_be_bytes(prefix) as usize).checked_add(4)?;
    if is_tiff_header(payload.get(start..)?) {
        return Some(start);
    }

    None
}

/// Read the orientation from a metadata item payload.
///
/// Values outside `1..=8` are clipped into range.
///
/// # Errors
///
/// Returns `GridError::MetadataExtractionFailed` if the payload is empty, has
/// no EXIF header, cannot be parsed, or carries no orientation tag.
pub fn orientation_from_exif_item(payload: &[u8]) -> Result<Orientation, GridError> {
    if payload.is_empty() {
        return Err(GridError::MetadataExtractionFailed(
            "Exif data is empty".to_string(),
        ));
    }

    let start = find_tiff_start(payload).ok_or_else(|| {
        GridError::MetadataExtractionFailed("Exif header not found".to_string())
    })?;

    let exif = Reader::new()
        .read_raw(payload[start..].to_vec())
        .map_err(|e| GridError::MetadataExtractionFailed(format!("Failed to parse Exif data: {}", e)))?;

    let field = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .ok_or_else(|| GridError::MetadataExtractionFailed("No orientation tag".to_string()))?;

    let value = field
        .value
        .get_uint(0)
        .map(i64::from)
        .ok_or_else(|| {
            GridError::MetadataExtractionFailed(format!(
                "Unreadable orientation value: {}",
                field.display_value()
            ))
        })?;

    Ok(Orientation::from_clipped(value))
}

/// Tag `canvas` with the outcome of orientation extraction.
///
/// A failure never blocks the image: the canvas comes back untagged and the
/// failure is returned as a warning.
pub fn apply_orientation(
    mut canvas: Canvas,
    orientation: Result<Orientation, GridError>,
) -> (Canvas, Option<GridError>) {
    match orientation {
        Ok(orientation) => {
            log::debug!("Orientation tag set to {}", orientation.value());
            canvas.orientation = Some(orientation);
            (canvas, None)
        }
        Err(e) => {
            let warning = match e {
                GridError::MetadataExtractionFailed(_) => e,
                other => GridError::MetadataExtractionFailed(other.to_string()),
            };
            log::warn!("Failed to set EXIF orientation: {}", warning);
            canvas.orientation = None;
            (canvas, Some(warning))
        }
    }
}
