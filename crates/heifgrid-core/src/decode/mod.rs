//! Tile decoding for grid reconstruction.
//!
//! This module provides functionality for:
//! - Normalizing frames from an external tile decoder into RGB tiles
//! - YCbCr to RGB conversion with an explicit, per-task context
//! - Scheduling tile decodes sequentially or in parallel
//!
//! # Architecture
//!
//! The bitstream decoder is an external collaborator behind [`TileDecoder`].
//! Each call returns a [`RawFrame`] in the decoder's native layout, which the
//! adapter converts into a [`DecodedTile`] sized exactly to the frame.
//!
//! # Ordering
//!
//! [`DecodeScheduler`] always returns tiles in input order, whatever order
//! the parallel tasks complete in. The stitcher places tiles by index, so
//! this is required for correct output.

mod adapter;
pub mod color;
mod scheduler;
mod types;

pub use adapter::{decode_tile, frame_to_rgb, TileDecoder};
pub use color::{ColorConverter, ColorMatrix, ColorRange};
pub use scheduler::{DecodeMode, DecodeScheduler};
pub use types::{
    CodecError, DecodedTile, GridError, Orientation, PixelLayout, Plane, RawFrame,
};
