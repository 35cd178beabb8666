//! PNG codec built from its layers.
//!
//! - [`crc`]: CRC-32 used by chunk framing
//! - [`filter`]: per-scanline predictive filters
//! - [`chunk`]: signature and chunk framing
//! - [`png`]: header validation, inflate/deflate, palette and gamma handling

pub mod chunk;
pub mod crc;
mod error;
pub mod filter;
pub mod png;

pub use chunk::{Chunk, ChunkType, PNG_SIGNATURE};
pub use crc::crc32;
pub use error::PngError;
pub use filter::FilterType;
pub use png::{decode, encode, encode_with, write_png, DecodedPng, EncodeOptions, DEFAULT_GAMMA};
