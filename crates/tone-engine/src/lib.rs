//! tone-engine: PNG decoding, color-space transcoding and tone processing
//!
//! The engine turns raster bytes into floating-point pixel buffers, moves
//! them between color models, and quantizes, levels or annotates them.
//!
//! # Quick Start
//!
//! ```
//! use tone_engine::buffer::{normalize, PixelBuffer};
//! use tone_engine::cache::Image;
//! use tone_engine::codec;
//! use tone_engine::color::ColorMode;
//!
//! let pixels = PixelBuffer::from_fn(4, 4, 3, |x, y, c| (x * 60 + y * 10 + c) as u8).unwrap();
//! let bytes = codec::encode(&pixels, 2.2).unwrap();
//!
//! let decoded = codec::decode(&bytes).unwrap();
//! let image = Image::new(normalize(&decoded.pixels, 255), ColorMode::Rgb, decoded.gamma);
//! let hsv = image.get(ColorMode::Hsv);
//! assert_eq!(hsv.channels(), 3);
//! ```
//!
//! # Components
//!
//! - [`codec`]: CRC-32, scanline filters, chunk framing and the PNG
//!   decode/encode pipeline built on them
//! - [`color`]: RGB, HSL, HSV, YCbCr (BT.601 and BT.709), YCoCg and CMY
//! - [`cache`]: [`Image`] nodes that memoize color-mode variants and share a
//!   gamma family
//! - [`dither`]: ordered, random and error-diffusion quantization
//! - [`histogram`]: density histogram graph and percentile auto-leveling
//! - [`draw`]: supersampled polygon and line coverage, plus overlay
//!
//! # Sample Ranges
//!
//! Integer buffers are what the codecs read and write. Everything else works
//! on `f64` samples nominally in `[0, 1]`. Luma/chroma modes produce signed
//! chroma in `[-0.5, 0.5]`; values are only clamped at the points where they
//! become integers again ([`buffer::to_8bit`], the dither levels).

pub mod buffer;
pub mod cache;
pub mod codec;
pub mod color;
pub mod dither;
pub mod draw;
pub mod histogram;


pub use buffer::{BufferError, PixelBuffer};
pub use cache::{GammaFamily, Image};
pub use codec::{DecodedPng, PngError};
pub use color::ColorMode;
pub use dither::{DitherAlgorithm, DitherError};
pub use draw::Point;
