//! HeifGrid Core - grid image reconstruction
//!
//! This crate rebuilds one contiguous image from a tiled grid item: tiles are
//! decoded by an external codec, normalized to RGB, stitched in raster order,
//! cropped to the grid's output size and tagged with their EXIF orientation.
//! Small requests can be served from the embedded thumbnail instead.
//!
//! Container parsing and bitstream decoding stay outside the crate, behind
//! the [`ContainerReader`] and [`TileDecoder`] traits.

pub mod container;
pub mod decode;
pub mod encode;
pub mod orientation;
pub mod pipeline;
pub mod select;
pub mod stitch;

pub use container::{ContainerReader, GridDescriptor, ItemId};
pub use decode::{
    CodecError, ColorConverter, DecodeMode, DecodeScheduler, DecodedTile, GridError,
    Orientation, RawFrame, TileDecoder,
};
pub use encode::{save, EncodeError, SaveOptions};
pub use pipeline::{
    convert, Conversion, ConvertOptions, OutputSpec, Pipeline, PipelineConfig, PipelineState,
};
pub use select::{select_path, DecodePath, THUMBNAIL_MAX_EDGE};
pub use stitch::{stitch_tiles, Canvas};
