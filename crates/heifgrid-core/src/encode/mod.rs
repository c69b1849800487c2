//! Image output for converted grids.
//!
//! This module provides functionality for:
//! - Rotating a canvas upright from its orientation tag
//! - Sizing to a target box, with optional fill-and-crop
//! - Encoding to JPEG, PNG, TIFF or PPM, picked by file extension
//!
//! # Examples
//!
//! ```ignore
//! use heifgrid_core::encode::{save, SaveOptions};
//!
//! let options = SaveOptions { width: 1024, ..SaveOptions::default() };
//! save(canvas, Path::new("out.jpg"), &options)?;
//! ```

mod format;
mod resize;
mod sink;

pub use format::{encode_image, encode_jpeg, EncodeError, OutputFormat};
pub use resize::{resize, resize_for_output, target_box, FilterType};
pub use sink::{rotate_upright, save, SaveOptions, DEFAULT_QUALITY};
