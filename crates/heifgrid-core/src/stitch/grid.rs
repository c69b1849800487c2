//! Grid stitcher: composites decoded tiles into one canvas.
//!
//! # Algorithm
//!
//! Tile width and height come from the tile at index 0. Tile `i` is placed at
//! `((i % columns) * tile_width, (i / columns) * tile_height)` on a working
//! canvas of `columns * tile_width` by `rows * tile_height`, which is then
//! cropped to the grid's output size. Right and bottom edge tiles usually
//! overhang the output area; the overhang is cut, never resampled.

use crate::container::GridDescriptor;
use crate::decode::{DecodedTile, GridError};

use super::Canvas;

/// Stitch `tiles` (in tile-index order) into a canvas of exactly
/// `grid.output_width x grid.output_height`.
///
/// Tiles are consumed; each buffer is freed once it has been composited.
///
/// # Errors
///
/// - `GridError::EmptyTileSet` if `tiles` is empty
/// - `GridError::TileCountMismatch` if `tiles.len() != columns * rows`
/// - `GridError::TileSizeMismatch` if a tile differs in size from tile 0
/// - `GridError::CanvasTooSmall` if the tiles cannot cover the output size
pub fn stitch_tiles(grid: &GridDescriptor, tiles: Vec<DecodedTile>) -> Result<Canvas, GridError> {
    let first = tiles.first().ok_or(GridError::EmptyTileSet)?;
    let (tile_width, tile_height) = first.dimensions();

    let expected = grid.tile_count();
    if tiles.len() != expected {
        return Err(GridError::TileCountMismatch {
            expected,
            actual: tiles.len(),
        });
    }

    if let Some(tile) = tiles
        .iter()
        .find(|t| t.dimensions() != (tile_width, tile_height))
    {
        return Err(GridError::TileSizeMismatch {
            index: tile.tile_index,
            expected: (tile_width, tile_height),
            actual: tile.dimensions(),
        });
    }

    let canvas_width = grid.columns.checked_mul(tile_width);
    let canvas_height = grid.rows.checked_mul(tile_height);
    let (canvas_width, canvas_height) = match (canvas_width, canvas_height) {
        (Some(w), Some(h)) if w >= grid.output_width && h >= grid.output_height => (w, h),
        (w, h) => {
            return Err(GridError::CanvasTooSmall {
                canvas_width: w.unwrap_or(u32::MAX),
                canvas_height: h.unwrap_or(u32::MAX),
                output_width: grid.output_width,
                output_height: grid.output_height,
            })
        }
    };

    log::debug!(
        "Stitching {} tiles of {}x{} onto {}x{}",
        tiles.len(),
        tile_width,
        tile_height,
        canvas_width,
        canvas_height
    );

    let mut canvas = Canvas::new(canvas_width, canvas_height);
    for (index, tile) in tiles.into_iter().enumerate() {
        let (x, y) = tile_offset(grid, index, tile_width, tile_height);
        canvas.blit(&tile, x, y);
    }

    canvas.extract_area(0, 0, grid.output_width, grid.output_height)
}

/// Canvas offset of the tile at `index`.
#[inline]
pub fn tile_offset(
    grid: &GridDescriptor,
    index: usize,
    tile_width: u32,
    tile_height: u32,
) -> (u32, u32) {
    let (row, column) = grid.position(index);
    (column * tile_width, row * tile_height)
}


// ============================================================================
// Property-Based Tests
// ============================================================================
