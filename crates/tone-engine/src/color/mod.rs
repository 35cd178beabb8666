//! Color model conversions.
//!
//! Every [`ColorMode`] converts to and from RGB; conversions between two
//! non-RGB modes route through RGB. All functions are pure and work on
//! `[0, 1]`-normalized samples.
//!
//! # Example
//!
//! ```
//! use tone_engine::color::{convert_pixel, ColorMode};
//!
//! let hsl = convert_pixel([1.0, 0.0, 0.0], ColorMode::Rgb, ColorMode::Hsl);
//! assert_eq!(hsl, [0.0, 1.0, 0.5]);
//! ```

mod hsx;
mod luma;

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::buffer::PixelBuffer;

pub use hsx::{hsl_to_rgb, hsv_to_rgb, rgb_to_hsl, rgb_to_hsv};
pub use luma::{LumaWeights, Mat3, BT601, BT709, YCOCG_FORWARD, YCOCG_INVERSE};

/// The closed set of color representations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Hue, saturation, lightness.
    Hsl,
    /// Hue, saturation, value.
    Hsv,
    /// Luma/chroma with BT.601 weights.
    YCbCr601,
    /// Luma/chroma with BT.709 weights.
    YCbCr709,
    /// Lifting-scheme luma/orange/green chroma.
    YCoCg,
    /// Cyan, magenta, yellow (`1 - rgb`).
    Cmy,
}

impl ColorMode {
    pub const ALL: [ColorMode; 7] = [
        ColorMode::Rgb,
        ColorMode::Hsl,
        ColorMode::Hsv,
        ColorMode::YCbCr601,
        ColorMode::YCbCr709,
        ColorMode::YCoCg,
        ColorMode::Cmy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ColorMode::Rgb => "rgb",
            ColorMode::Hsl => "hsl",
            ColorMode::Hsv => "hsv",
            ColorMode::YCbCr601 => "ycbcr601",
            ColorMode::YCbCr709 => "ycbcr709",
            ColorMode::YCoCg => "ycocg",
            ColorMode::Cmy => "cmy",
        }
    }

    /// Convert one pixel of this mode to RGB.
    pub fn to_rgb(self, pixel: [f64; 3]) -> [f64; 3] {
        match self {
            ColorMode::Rgb => pixel,
            ColorMode::Hsl => hsl_to_rgb(pixel),
            ColorMode::Hsv => hsv_to_rgb(pixel),
            ColorMode::YCbCr601 => luma::apply(&BT601.inverse(), pixel),
            ColorMode::YCbCr709 => luma::apply(&BT709.inverse(), pixel),
            ColorMode::YCoCg => luma::apply(&YCOCG_INVERSE, pixel),
            ColorMode::Cmy => complement(pixel),
        }
    }

    /// Convert one RGB pixel to this mode.
    pub fn from_rgb(self, pixel: [f64; 3]) -> [f64; 3] {
        match self {
            ColorMode::Rgb => pixel,
            ColorMode::Hsl => rgb_to_hsl(pixel),
            ColorMode::Hsv => rgb_to_hsv(pixel),
            ColorMode::YCbCr601 => luma::apply(&BT601.forward(), pixel),
            ColorMode::YCbCr709 => luma::apply(&BT709.forward(), pixel),
            ColorMode::YCoCg => luma::apply(&YCOCG_FORWARD, pixel),
            ColorMode::Cmy => complement(pixel),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown color mode name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color mode '{0}' (expected one of rgb, hsl, hsv, ycbcr601, ycbcr709, ycocg, cmy)")]
pub struct ParseColorModeError(pub String);

impl FromStr for ColorMode {
    type Err = ParseColorModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ColorMode::ALL
            .into_iter()
            .find(|mode| mode.name() == lower)
            .ok_or_else(|| ParseColorModeError(s.to_string()))
    }
}

#[inline]
fn complement(pixel: [f64; 3]) -> [f64; 3] {
    pixel.map(|c| 1.0 - c)
}

/// Convert a single pixel between two modes via RGB.
pub fn convert_pixel(pixel: [f64; 3], from: ColorMode, to: ColorMode) -> [f64; 3] {
    to.from_rgb(from.to_rgb(pixel))
}

/// Per-mode transform prepared once per image.
///
/// Matrix modes build their matrix here instead of per pixel; the per-pixel
/// arithmetic is the same as [`ColorMode::to_rgb`]/[`ColorMode::from_rgb`],
/// so whole-image and single-pixel conversions agree bit for bit.
enum Step {
    Identity,
    Matrix(Mat3),
    Func(fn([f64; 3]) -> [f64; 3]),
}

impl Step {
    fn to_rgb(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Rgb => Step::Identity,
            ColorMode::Hsl => Step::Func(hsl_to_rgb),
            ColorMode::Hsv => Step::Func(hsv_to_rgb),
            ColorMode::YCbCr601 => Step::Matrix(BT601.inverse()),
            ColorMode::YCbCr709 => Step::Matrix(BT709.inverse()),
            ColorMode::YCoCg => Step::Matrix(YCOCG_INVERSE),
            ColorMode::Cmy => Step::Func(complement),
        }
    }

    fn from_rgb(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Rgb => Step::Identity,
            ColorMode::Hsl => Step::Func(rgb_to_hsl),
            ColorMode::Hsv => Step::Func(rgb_to_hsv),
            ColorMode::YCbCr601 => Step::Matrix(BT601.forward()),
            ColorMode::YCbCr709 => Step::Matrix(BT709.forward()),
            ColorMode::YCoCg => Step::Matrix(YCOCG_FORWARD),
            ColorMode::Cmy => Step::Func(complement),
        }
    }

    #[inline]
    fn apply(&self, pixel: [f64; 3]) -> [f64; 3] {
        match self {
            Step::Identity => pixel,
            Step::Matrix(m) => luma::apply(m, pixel),
            Step::Func(f) => f(pixel),
        }
    }
}

/// Convert a whole image between two modes.
///
/// Applies `from`'s inverse unless it is RGB, then `to`'s forward transform
/// unless it is RGB; RGB to RGB is the identity. A single-channel buffer is
/// treated as gray RGB and expanded to three channels before any other
/// conversion.
pub fn convert(buffer: &PixelBuffer<f64>, from: ColorMode, to: ColorMode) -> PixelBuffer<f64> {
    if from == ColorMode::Rgb && to == ColorMode::Rgb {
        return buffer.clone();
    }
    let mut out = buffer.expand_gray();
    let inverse = Step::to_rgb(from);
    let forward = Step::from_rgb(to);
    for px in out.as_mut_slice().chunks_exact_mut(3) {
        let converted = forward.apply(inverse.apply([px[0], px[1], px[2]]));
        px.copy_from_slice(&converted);
    }
    out
}
