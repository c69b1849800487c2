//! Boundary with the external container reader.
//!
//! Box parsing is not done here. A [`ContainerReader`] implementation locates
//! the grid item, its tiles, the thumbnail reference and the metadata item,
//! and hands them over as plain values.

use serde::{Deserialize, Serialize};

use crate::decode::{GridError, Orientation};
use crate::orientation::orientation_from_exif_item;

/// Opaque identifier of a container item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Layout of a grid item: output size and the tiles that make it up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDescriptor {
    /// The grid item itself.
    pub item_id: ItemId,
    /// Final cropped width in pixels.
    pub output_width: u32,
    /// Final cropped height in pixels.
    pub output_height: u32,
    /// Number of tile columns (at least 1).
    pub columns: u32,
    /// Number of tile rows (at least 1).
    pub rows: u32,
    /// Tiles in row-major raster order, `columns * rows` of them.
    pub tile_ids: Vec<ItemId>,
}

impl GridDescriptor {
    /// Build a descriptor from the values stored in the container, which
    /// records zero-based row and column counts.
    pub fn from_stored(
        item_id: ItemId,
        output_width: u32,
        output_height: u32,
        rows_minus_one: u8,
        columns_minus_one: u8,
        tile_ids: Vec<ItemId>,
    ) -> Result<Self, GridError> {
        let descriptor = Self {
            item_id,
            output_width,
            output_height,
            columns: columns_minus_one as u32 + 1,
            rows: rows_minus_one as u32 + 1,
            tile_ids,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Check the descriptor invariants.
    ///
    /// # Errors
    ///
    /// - `GridError::EmptyTileSet` if there are no tiles
    /// - `GridError::InvalidDimensions` for a zero output size or grid size
    /// - `GridError::TileCountMismatch` if the tile list is not `columns * rows` long
    pub fn validate(&self) -> Result<(), GridError> {
        if self.tile_ids.is_empty() {
            return Err(GridError::EmptyTileSet);
        }
        if self.output_width == 0 || self.output_height == 0 {
            return Err(GridError::InvalidDimensions {
                width: self.output_width,
                height: self.output_height,
            });
        }
        if self.columns == 0 || self.rows == 0 {
            return Err(GridError::InvalidDimensions {
                width: self.columns,
                height: self.rows,
            });
        }

        let expected = self.tile_count();
        if self.tile_ids.len() != expected {
            return Err(GridError::TileCountMismatch {
                expected,
                actual: self.tile_ids.len(),
            });
        }
        Ok(())
    }

    /// `columns * rows`.
    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// `(row, column)` of the tile at `index`.
    #[inline]
    pub fn position(&self, index: usize) -> (u32, u32) {
        let columns = self.columns as usize;
        ((index / columns) as u32, (index % columns) as u32)
    }
}

/// What the pipeline needs from a parsed container.
pub trait ContainerReader {
    /// Resolve the primary grid item.
    ///
    /// Returns `GridError::GridNotFound` when the source has no grid.
    fn grid_descriptor(&self) -> Result<GridDescriptor, GridError>;

    /// The thumbnail item referencing `grid_item`, if any.
    fn thumbnail_reference(&self, grid_item: ItemId) -> Option<ItemId>;

    /// Compressed bytes of `item`, prefixed with the decoder parameters
    /// stored for `decoder_params`.
    fn compressed_data(&self, item: ItemId, decoder_params: ItemId) -> Result<Vec<u8>, GridError>;

    /// Payload of the metadata item describing `grid_item`, if any.
    fn metadata_item(&self, grid_item: ItemId) -> Option<Vec<u8>>;

    /// Orientation of `grid_item`.
    ///
    /// The default parses the EXIF payload from [`Self::metadata_item`].
    fn orientation(&self, grid_item: ItemId) -> Result<Orientation, GridError> {
        let payload = self.metadata_item(grid_item).ok_or_else(|| {
            GridError::MetadataExtractionFailed(format!("no metadata item for {}", grid_item))
        })?;
        orientation_from_exif_item(&payload)
    }
}
