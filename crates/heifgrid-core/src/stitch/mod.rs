//! Grid reconstruction: placing decoded tiles onto one canvas.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner
//! - Tile `i` sits in row `i / columns`, column `i % columns`
//! - The working canvas is cropped to the grid output size at the end

mod canvas;
mod grid;

pub use canvas::Canvas;
pub use grid::{stitch_tiles, tile_offset};
