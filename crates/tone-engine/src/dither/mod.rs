//! Quantization to N-bit depth.
//!
//! All algorithms take a `[0, 1]` buffer and return one whose samples are
//! exactly `k / q` for an integer level `k` in `[0, q]`, where
//! `q = 2^bits - 1`.
//!
//! # Algorithms
//!
//! - **Ordered**: fixed 8x8 Bayer threshold tile
//! - **Random (sync / independent)**: uniform noise threshold, one draw per
//!   pixel or one per sample
//! - **Floyd-Steinberg** and **Atkinson**: sequential error diffusion
//!
//! # Example
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use tone_engine::buffer::PixelBuffer;
//! use tone_engine::dither::{dither_with_rng, DitherAlgorithm};
//!
//! let gray = PixelBuffer::filled(4, 4, 1, 0.5).unwrap();
//! let mut rng = StdRng::seed_from_u64(0);
//! let out = dither_with_rng(&gray, 1, DitherAlgorithm::FloydSteinberg, &mut rng).unwrap();
//! assert!(out.as_slice().iter().all(|&v| v == 0.0 || v == 1.0));
//! ```

mod diffusion;
mod kernel;
mod ordered;
mod random;

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use thiserror::Error;

use crate::buffer::PixelBuffer;

pub use diffusion::{diffuse, ErrorBuffer};
pub use kernel::{Kernel, ATKINSON, FLOYD_STEINBERG};
pub use ordered::{threshold_tile, TILE_SIZE};

/// Largest supported bit depth.
pub const MAX_BITS: u8 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DitherError {
    #[error("bit depth must be between 1 and {MAX_BITS}, got {0}")]
    InvalidBits(u8),

    #[error("unknown dither algorithm '{0}' (expected one of ordered, random_sync, random_nosync, floyd, atkinson)")]
    UnknownAlgorithm(String),
}

/// Dithering algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DitherAlgorithm {
    /// 8x8 Bayer threshold map.
    Ordered,

    /// Uniform noise, one draw per pixel shared by its channels.
    RandomSync,

    /// Uniform noise drawn separately for every sample.
    RandomIndependent,

    /// Floyd-Steinberg error diffusion (100% propagation).
    #[default]
    FloydSteinberg,

    /// Atkinson error diffusion (75% propagation).
    Atkinson,
}

impl DitherAlgorithm {
    pub const ALL: [DitherAlgorithm; 5] = [
        DitherAlgorithm::Ordered,
        DitherAlgorithm::RandomSync,
        DitherAlgorithm::RandomIndependent,
        DitherAlgorithm::FloydSteinberg,
        DitherAlgorithm::Atkinson,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DitherAlgorithm::Ordered => "ordered",
            DitherAlgorithm::RandomSync => "random_sync",
            DitherAlgorithm::RandomIndependent => "random_nosync",
            DitherAlgorithm::FloydSteinberg => "floyd",
            DitherAlgorithm::Atkinson => "atkinson",
        }
    }

    /// Whether the output depends on a random source.
    pub fn is_random(self) -> bool {
        matches!(
            self,
            DitherAlgorithm::RandomSync | DitherAlgorithm::RandomIndependent
        )
    }
}

impl fmt::Display for DitherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DitherAlgorithm {
    type Err = DitherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        DitherAlgorithm::ALL
            .into_iter()
            .find(|a| a.name() == lower)
            .ok_or_else(|| DitherError::UnknownAlgorithm(s.to_string()))
    }
}

/// Maps `[0, 1]` samples onto the integer levels `0..=q`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    q: f64,
}

/// Products this close to an integer are treated as that integer, so
/// inputs already on a level (`k / q`) stay there.
const SNAP_EPSILON: f64 = 1e-9;

impl Quantizer {
    /// `bits` must already be validated to `1..=MAX_BITS`.
    pub fn new(bits: u8) -> Self {
        Self {
            q: f64::from((1u16 << bits) - 1),
        }
    }

    /// Highest level, `2^bits - 1`.
    pub fn levels(self) -> f64 {
        self.q
    }

    #[inline]
    pub fn scale(self, value: f64) -> f64 {
        let scaled = value * self.q;
        let nearest = scaled.round();
        if (scaled - nearest).abs() < SNAP_EPSILON {
            nearest
        } else {
            scaled
        }
    }

    /// Nearest level, clamped to `[0, q]`.
    #[inline]
    pub fn level(self, scaled: f64) -> f64 {
        scaled.round().clamp(0.0, self.q)
    }

    #[inline]
    pub fn unscale(self, level: f64) -> f64 {
        level / self.q
    }
}

fn quantizer(bits: u8) -> Result<Quantizer, DitherError> {
    if !(1..=MAX_BITS).contains(&bits) {
        return Err(DitherError::InvalidBits(bits));
    }
    Ok(Quantizer::new(bits))
}

/// Dither with the thread-local RNG for the random variants.
pub fn dither(
    buffer: &PixelBuffer<f64>,
    bits: u8,
    algorithm: DitherAlgorithm,
) -> Result<PixelBuffer<f64>, DitherError> {
    dither_with_rng(buffer, bits, algorithm, &mut rand::thread_rng())
}

/// Dither with an explicit random source.
///
/// `rng` is only drawn from by the random variants; a seeded RNG makes
/// their output reproducible.
pub fn dither_with_rng<R: Rng>(
    buffer: &PixelBuffer<f64>,
    bits: u8,
    algorithm: DitherAlgorithm,
    rng: &mut R,
) -> Result<PixelBuffer<f64>, DitherError> {
    let quantizer = quantizer(bits)?;
    tracing::debug!(%algorithm, bits, width = buffer.width(), height = buffer.height(), "dithering");
    let out = match algorithm {
        DitherAlgorithm::Ordered => ordered::ordered(buffer, quantizer),
        DitherAlgorithm::RandomSync => random::random(buffer, quantizer, true, rng),
        DitherAlgorithm::RandomIndependent => random::random(buffer, quantizer, false, rng),
        DitherAlgorithm::FloydSteinberg => diffuse(buffer, quantizer, &FLOYD_STEINBERG),
        DitherAlgorithm::Atkinson => diffuse(buffer, quantizer, &ATKINSON),
    };
    Ok(out)
}
