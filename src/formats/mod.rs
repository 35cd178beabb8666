//! File format detection and the byte-level read/write entry points.

pub mod pnm;

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tone_engine::codec::{self, PNG_SIGNATURE};
use tone_engine::PixelBuffer;

use crate::error::{AppError, PnmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Pnm,
}

impl ImageFormat {
    /// Identify a format from the leading bytes of a file.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&PNG_SIGNATURE) {
            return Some(ImageFormat::Png);
        }
        match bytes.get(..2) {
            Some(b"P2" | b"P3" | b"P5" | b"P6") => Some(ImageFormat::Pnm),
            _ => None,
        }
    }

    /// Identify a format from a path's extension (case-insensitive).
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "pnm" | "pgm" | "ppm" => Some(ImageFormat::Pnm),
            _ => None,
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ImageFormat::Png => "png",
            ImageFormat::Pnm => "pnm",
        })
    }
}

/// Samples read from disk, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub format: ImageFormat,
    pub samples: PixelBuffer<u16>,
    pub max_value: u32,
    /// Encoding gamma stored in the file, if the format carries one.
    pub gamma: Option<f64>,
}

/// Read and decode a file.
///
/// The format comes from the file's magic bytes, falling back to the
/// extension so that a PNM with a bad tag still reports `Unknown tag`.
pub fn read(path: &Path) -> Result<RawImage, AppError> {
    let bytes =
        std::fs::read(path).map_err(|_| PnmError::FileOpen(path.display().to_string()))?;
    let format = ImageFormat::detect(&bytes)
        .or_else(|| ImageFormat::from_extension(path))
        .ok_or_else(|| AppError::UnsupportedFormat(path.display().to_string()))?;
    decode(format, &bytes)
}

pub fn decode(format: ImageFormat, bytes: &[u8]) -> Result<RawImage, AppError> {
    match format {
        ImageFormat::Png => {
            let decoded = codec::decode(bytes)?;
            Ok(RawImage {
                format,
                samples: decoded.pixels.map(u16::from),
                max_value: 255,
                gamma: Some(decoded.gamma),
            })
        }
        ImageFormat::Pnm => {
            let (samples, max_value) = pnm::decode(bytes)?;
            Ok(RawImage {
                format,
                samples,
                max_value,
                gamma: None,
            })
        }
    }
}

/// Encode 8-bit samples. `gamma` is recorded only by formats that carry it.
pub fn encode(format: ImageFormat, pixels: &PixelBuffer<u8>, gamma: f64) -> Result<Vec<u8>, AppError> {
    let bytes = match format {
        ImageFormat::Png => codec::encode(pixels, gamma)?,
        ImageFormat::Pnm => pnm::encode(pixels, 255)?,
    };
    Ok(bytes)
}

/// Encode by the output path's extension and write in one call.
pub fn write(path: &Path, pixels: &PixelBuffer<u8>, gamma: f64) -> Result<(), AppError> {
    let format = ImageFormat::from_extension(path)
        .ok_or_else(|| AppError::UnsupportedFormat(path.display().to_string()))?;
    let bytes = encode(format, pixels, gamma)?;
    std::fs::write(path, &bytes)?;
    tracing::debug!(path = %path.display(), %format, bytes = bytes.len(), "wrote image");
    Ok(())
}
