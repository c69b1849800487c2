//! Core types for tile decoding and grid reconstruction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by an external tile decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Error types for grid reconstruction.
#[derive(Debug, Error)]
pub enum GridError {
    /// The source has no grid configuration.
    #[error("Grid configuration not found; only tiled grid images are supported")]
    GridNotFound,

    /// The thumbnail fast path was selected but the grid item has no thumbnail.
    #[error("Thumbnail item not found")]
    ThumbnailNotFound,

    /// The codec rejected one tile. The whole conversion fails.
    #[error("Failed to decode tile {index}: {source}")]
    TileDecodeFailed {
        index: usize,
        #[source]
        source: CodecError,
    },

    /// The grid descriptor resolved to zero tiles.
    #[error("Grid has no tiles")]
    EmptyTileSet,

    /// Orientation could not be read. Never fatal.
    #[error("Metadata extraction failed: {0}")]
    MetadataExtractionFailed(String),

    /// Tile list length does not match `columns * rows`.
    #[error("Grid expects {expected} tiles, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },

    /// Output or grid dimensions are zero.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// A tile does not share the dimensions of tile 0.
    #[error("Tile {index} is {}x{}, expected {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    TileSizeMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// The tile grid does not cover the requested output area.
    #[error("Tiles cover {canvas_width}x{canvas_height}, output needs {output_width}x{output_height}")]
    CanvasTooSmall {
        canvas_width: u32,
        canvas_height: u32,
        output_width: u32,
        output_height: u32,
    },

    /// A decoded frame does not match its declared layout.
    #[error("Invalid decoded frame: {0}")]
    InvalidFrame(String),

    /// The container reader could not supply item data.
    #[error("Container error: {0}")]
    Container(String),

    /// The dedicated decode pool could not be built.
    #[error("Decode thread pool unavailable: {0}")]
    ThreadPool(String),
}

impl GridError {
    /// Returns true for errors that abort a conversion.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GridError::MetadataExtractionFailed(_))
    }
}

/// EXIF orientation values (1-8).
/// See: https://exiftool.org/TagNames/EXIF.html
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl Orientation {
    /// Build an orientation from a raw tag value, clipping it into `[1, 8]`.
    pub fn from_clipped(value: i64) -> Self {
        match value.clamp(1, 8) {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            _ => Orientation::Rotate270CW,
        }
    }

    /// The EXIF tag value.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Returns true if this orientation swaps width and height dimensions.
    #[inline]
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90CW
                | Orientation::Transverse
                | Orientation::Rotate270CW
        )
    }
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        Orientation::from_clipped(value as i64)
    }
}

/// Native pixel layout of a frame produced by the tile decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Planar YCbCr with chroma halved in both directions.
    Yuv420,
    /// Planar YCbCr with chroma halved horizontally.
    Yuv422,
    /// Planar YCbCr at full chroma resolution.
    Yuv444,
    /// Single luma plane.
    Gray,
    /// One plane of interleaved RGB triplets.
    Rgb,
}

impl PixelLayout {
    /// Number of planes the layout carries.
    pub fn plane_count(self) -> usize {
        match self {
            PixelLayout::Yuv420 | PixelLayout::Yuv422 | PixelLayout::Yuv444 => 3,
            PixelLayout::Gray | PixelLayout::Rgb => 1,
        }
    }

    /// Chroma subsampling factors `(x, y)`.
    pub fn chroma_subsampling(self) -> (u32, u32) {
        match self {
            PixelLayout::Yuv420 => (2, 2),
            PixelLayout::Yuv422 => (2, 1),
            _ => (1, 1),
        }
    }
}

/// One plane of a raw frame. Rows are `stride` bytes apart.
#[derive(Debug, Clone)]
pub struct Plane {
    pub data: Vec<u8>,
    pub stride: usize,
}

impl Plane {
    pub fn new(data: Vec<u8>, stride: usize) -> Self {
        Self { data, stride }
    }

    /// Bytes of row `y`, `len` bytes long.
    #[inline]
    pub(crate) fn row(&self, y: usize, len: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + len]
    }
}

/// A frame as handed back by the tile decoder, before normalization.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub planes: Vec<Plane>,
}

impl RawFrame {
    /// Build a tightly packed planar 4:2:0 frame.
    pub fn yuv420(width: u32, height: u32, y: Vec<u8>, cb: Vec<u8>, cr: Vec<u8>) -> Self {
        let chroma_stride = width.div_ceil(2) as usize;
        Self {
            width,
            height,
            layout: PixelLayout::Yuv420,
            planes: vec![
                Plane::new(y, width as usize),
                Plane::new(cb, chroma_stride),
                Plane::new(cr, chroma_stride),
            ],
        }
    }

    /// Build a tightly packed interleaved RGB frame.
    pub fn rgb(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            layout: PixelLayout::Rgb,
            planes: vec![Plane::new(pixels, width as usize * 3)],
        }
    }
}

/// A decoded tile with RGB pixel data, tagged with its grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTile {
    /// Position in the grid's tile list (0-based, row-major).
    pub tile_index: usize,
    /// Tile width in pixels.
    pub width: u32,
    /// Tile height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    /// Length is width * height * 3.
    pub pixels: Vec<u8>,
}

impl DecodedTile {
    /// Create a new DecodedTile with the given dimensions and pixel data.
    pub fn new(tile_index: usize, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            tile_index,
            width,
            height,
            pixels,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }
}
