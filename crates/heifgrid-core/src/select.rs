//! Thumbnail fast-path selection.
//!
//! Decoding a full grid costs dozens of tile decodes. When the caller asks
//! for the embedded thumbnail, or for an output small enough that the
//! thumbnail's resolution suffices, the single thumbnail item is decoded
//! instead.

use serde::{Deserialize, Serialize};

use crate::container::ItemId;
use crate::decode::GridError;
use crate::pipeline::OutputSpec;

/// Largest requested edge, in pixels, still served from the thumbnail.
pub const THUMBNAIL_MAX_EDGE: u32 = 240;

/// Which reconstruction path a conversion takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecodePath {
    /// Decode only the referenced thumbnail item.
    Thumbnail(ItemId),
    /// Decode and stitch every grid tile.
    Grid,
}

/// Returns true when `spec` should be served from the thumbnail.
///
/// The thumbnail is used when explicitly requested, or when a target width is
/// given and neither bound exceeds `max_edge`. A height alone does not size
/// the output.
pub fn wants_thumbnail(spec: &OutputSpec, max_edge: u32) -> bool {
    if spec.thumbnail_requested {
        return true;
    }
    spec.target_width > 0 && spec.target_width <= max_edge && spec.target_height <= max_edge
}

/// Pick the decode path for `spec`.
///
/// # Errors
///
/// Returns `GridError::ThumbnailNotFound` when the thumbnail path is wanted
/// but the source has no thumbnail item. There is no silent fallback to the
/// full grid.
pub fn select_path(
    spec: &OutputSpec,
    thumbnail: Option<ItemId>,
    max_edge: u32,
) -> Result<DecodePath, GridError> {
    if !wants_thumbnail(spec, max_edge) {
        return Ok(DecodePath::Grid);
    }
    thumbnail
        .map(DecodePath::Thumbnail)
        .ok_or(GridError::ThumbnailNotFound)
}
