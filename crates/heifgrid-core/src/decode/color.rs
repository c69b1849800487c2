//! YCbCr to RGB conversion for decoded tiles.
//!
//! A `ColorConverter` is a plain `Copy` value. Every decode task receives its
//! own copy, so concurrent tasks never share conversion state.

use serde::{Deserialize, Serialize};

/// Matrix coefficients used to derive RGB from YCbCr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMatrix {
    /// ITU-R BT.601.
    #[default]
    Bt601,
    /// ITU-R BT.709.
    Bt709,
}

impl ColorMatrix {
    /// `(Kr, Kb)` luma weights.
    fn weights(self) -> (f32, f32) {
        match self {
            ColorMatrix::Bt601 => (0.299, 0.114),
            ColorMatrix::Bt709 => (0.2126, 0.0722),
        }
    }
}

/// Quantization range of the YCbCr samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorRange {
    /// Luma in 16..=235, chroma in 16..=240.
    #[default]
    Limited,
    /// Full 0..=255 for all components.
    Full,
}

/// Conversion context passed explicitly into every tile decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorConverter {
    pub matrix: ColorMatrix,
    pub range: ColorRange,
}

impl ColorConverter {
    pub fn new(matrix: ColorMatrix, range: ColorRange) -> Self {
        Self { matrix, range }
    }

    /// Precomputed coefficients for a row loop.
    pub(crate) fn coefficients(self) -> Coefficients {
        let (kr, kb) = self.matrix.weights();
        let kg = 1.0 - kr - kb;
        let (y_offset, y_scale, c_scale) = match self.range {
            ColorRange::Limited => (16.0, 255.0 / 219.0, 255.0 / 224.0),
            ColorRange::Full => (0.0, 1.0, 1.0),
        };
        Coefficients {
            y_offset,
            y_scale,
            cr_r: 2.0 * (1.0 - kr) * c_scale,
            cb_g: 2.0 * (1.0 - kb) * kb / kg * c_scale,
            cr_g: 2.0 * (1.0 - kr) * kr / kg * c_scale,
            cb_b: 2.0 * (1.0 - kb) * c_scale,
        }
    }

    /// Convert one sample triple.
    #[inline]
    pub fn to_rgb(self, y: u8, cb: u8, cr: u8) -> [u8; 3] {
        self.coefficients().apply(y, cb, cr)
    }

    /// Luma-only sample to RGB.
    #[inline]
    pub fn gray_to_rgb(self, y: u8) -> [u8; 3] {
        let c = self.coefficients();
        let v = clamp_u8((y as f32 - c.y_offset) * c.y_scale);
        [v, v, v]
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Coefficients {
    y_offset: f32,
    y_scale: f32,
    cr_r: f32,
    cb_g: f32,
    cr_g: f32,
    cb_b: f32,
}

impl Coefficients {
    #[inline]
    pub(crate) fn apply(&self, y: u8, cb: u8, cr: u8) -> [u8; 3] {
        let y = (y as f32 - self.y_offset) * self.y_scale;
        let cb = cb as f32 - 128.0;
        let cr = cr as f32 - 128.0;

        [
            clamp_u8(y + self.cr_r * cr),
            clamp_u8(y - self.cb_g * cb - self.cr_g * cr),
            clamp_u8(y + self.cb_b * cb),
        ]
    }
}

#[inline]
fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_601() -> ColorConverter {
        ColorConverter::new(ColorMatrix::Bt601, ColorRange::Full)
    }

    #[test]
    fn test_neutral_chroma_is_gray() {
        let conv = full_601();
        assert_eq!(conv.to_rgb(0, 128, 128), [0, 0, 0]);
        assert_eq!(conv.to_rgb(128, 128, 128), [128, 128, 128]);
        assert_eq!(conv.to_rgb(255, 128, 128), [255, 255, 255]);
    }

    #[test]
    fn test_limited_range_expands() {
        let conv = ColorConverter::default();
        assert_eq!(conv.to_rgb(16, 128, 128), [0, 0, 0]);
        assert_eq!(conv.to_rgb(235, 128, 128), [255, 255, 255]);
        assert_eq!(conv.gray_to_rgb(16), [0, 0, 0]);
    }

    #[test]
    fn test_full_range_primaries() {
        let conv = full_601();
        // Pure red in BT.601 full range: Y=76, Cb=85, Cr=255
        let [r, g, b] = conv.to_rgb(76, 85, 255);
        assert!(r >= 250, "r = {}", r);
        assert!(g <= 5, "g = {}", g);
        assert!(b <= 5, "b = {}", b);
    }

    #[test]
    fn test_bt709_differs_from_bt601() {
        let a = ColorConverter::new(ColorMatrix::Bt601, ColorRange::Full).to_rgb(120, 90, 200);
        let b = ColorConverter::new(ColorMatrix::Bt709, ColorRange::Full).to_rgb(120, 90, 200);
        assert_ne!(a, b);
    }

    #[test]
    fn test_output_clamped() {
        let conv = full_601();
        assert_eq!(conv.to_rgb(255, 255, 255)[0], 255);
        assert_eq!(conv.to_rgb(0, 0, 0)[0], 0);
    }
}
