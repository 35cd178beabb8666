//! PNG decode and encode.
//!
//! Supports 8-bit, non-interlaced grayscale (type 0), RGB (type 2) and
//! palette (type 3) images. Palette images are expanded to RGB on decode;
//! the encoder writes grayscale or RGB only.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::chunk::{self, Chunk, ChunkType, PNG_SIGNATURE};
use super::error::PngError;
use super::filter::{defilter, filter, FilterType};
use crate::buffer::PixelBuffer;

/// Gamma assumed when no `gAMA` chunk is present, or when a color profile
/// marker (`sRGB`/`iCCP`) overrides it.
pub const DEFAULT_GAMMA: f64 = 2.2;

/// `gAMA` stores gamma multiplied by this factor.
const GAMMA_SCALE: f64 = 100_000.0;

/// Maximum payload of one `IDAT` chunk written by the encoder.
pub const MAX_IDAT_SIZE: usize = 8192;

/// PNG color types that can appear in `IHDR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Grayscale,
    Rgb,
    Indexed,
}

impl ColorType {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ColorType::Grayscale),
            2 => Some(ColorType::Rgb),
            3 => Some(ColorType::Indexed),
            _ => None,
        }
    }

    fn code(self) -> u8 {
        match self {
            ColorType::Grayscale => 0,
            ColorType::Rgb => 2,
            ColorType::Indexed => 3,
        }
    }

    /// Bytes per pixel in the filtered stream (8-bit samples).
    fn bytes_per_pixel(self) -> usize {
        match self {
            ColorType::Rgb => 3,
            ColorType::Grayscale | ColorType::Indexed => 1,
        }
    }
}

/// Parsed `IHDR` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: ColorType,
    pub compression: u8,
    pub filter_method: u8,
    pub interlace: u8,
}

impl Header {
    const LEN: usize = 13;

    /// Read and validate an `IHDR` payload.
    pub fn parse(data: &[u8]) -> Result<Self, PngError> {
        let content = || format!("{data:02X?}");
        if data.len() != Self::LEN {
            return Err(PngError::invalid("IHDR", content()));
        }
        let width = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let height = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let (bit_depth, color_code, compression, filter_method, interlace) =
            (data[8], data[9], data[10], data[11], data[12]);

        tracing::debug!(
            width,
            height,
            bit_depth,
            color_type = color_code,
            compression,
            filter_method,
            interlace,
            "read IHDR"
        );

        let color_type = ColorType::from_code(color_code);
        match color_type {
            Some(color_type)
                if width != 0
                    && height != 0
                    && bit_depth == 8
                    && compression == 0
                    && interlace == 0 =>
            {
                let header = Self {
                    width,
                    height,
                    bit_depth,
                    color_type,
                    compression,
                    filter_method,
                    interlace,
                };
                if header.stream_len().is_none() {
                    return Err(PngError::invalid(
                        "IHDR",
                        format!("{width}x{height} image is too large"),
                    ));
                }
                Ok(header)
            }
            _ => Err(PngError::invalid("IHDR", content())),
        }
    }

    /// Length of the filtered scanline stream, or `None` when it does not
    /// fit in `usize`.
    pub fn stream_len(&self) -> Option<usize> {
        let stride = usize::try_from(self.width)
            .ok()?
            .checked_mul(self.color_type.bytes_per_pixel())?;
        stride
            .checked_add(1)?
            .checked_mul(usize::try_from(self.height).ok()?)
    }

    fn to_bytes(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.extend_from_slice(&self.width.to_be_bytes());
        out.extend_from_slice(&self.height.to_be_bytes());
        out.extend_from_slice(&[
            self.bit_depth,
            self.color_type.code(),
            self.compression,
            self.filter_method,
            self.interlace,
        ]);
        out
    }
}

/// Result of decoding a PNG stream.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPng {
    /// 8-bit samples; 1 channel for grayscale, 3 for RGB and palette input.
    pub pixels: PixelBuffer<u8>,
    /// Encoding gamma of the samples.
    pub gamma: f64,
}

fn find(chunks: &[Chunk], kind: ChunkType) -> Option<&Chunk> {
    chunks.iter().find(|c| c.chunk_type == kind)
}

/// Resolve the encoding gamma from metadata chunks.
///
/// A color profile marker wins over `gAMA`; without either the default
/// applies.
fn read_gamma(chunks: &[Chunk]) -> Result<f64, PngError> {
    if find(chunks, ChunkType::sRGB).is_some() || find(chunks, ChunkType::iCCP).is_some() {
        return Ok(DEFAULT_GAMMA);
    }
    match find(chunks, ChunkType::gAMA) {
        None => Ok(DEFAULT_GAMMA),
        Some(chunk) => {
            let bytes: [u8; 4] = chunk
                .data
                .as_slice()
                .try_into()
                .map_err(|_| PngError::invalid("gAMA", format!("{:02X?}", chunk.data)))?;
            let raw = u32::from_be_bytes(bytes);
            if raw == 0 {
                return Err(PngError::invalid("gAMA", "gamma of zero"));
            }
            Ok(raw as f64 / GAMMA_SCALE)
        }
    }
}

/// Map palette indices to RGB triplets. `palette` length is a multiple of 3.
fn expand_palette(indices: &[u8], palette: &[u8]) -> Result<Vec<u8>, PngError> {
    let entries = palette.len() / 3;
    let mut rgb = Vec::with_capacity(indices.len() * 3);
    for &index in indices {
        let i = index as usize;
        if i >= entries {
            return Err(PngError::invalid(
                "PLTE",
                format!("index {i} out of range for {entries} entries"),
            ));
        }
        rgb.extend_from_slice(&palette[i * 3..i * 3 + 3]);
    }
    Ok(rgb)
}

/// Decode a complete PNG byte stream.
///
/// All validation (signature, chunk tags, terminal `IEND`, header fields,
/// palette length) happens before any pixel buffer is produced.
pub fn decode(bytes: &[u8]) -> Result<DecodedPng, PngError> {
    let chunks = chunk::parse(bytes)?;

    let ihdr = find(&chunks, ChunkType::IHDR)
        .ok_or_else(|| PngError::ChunkNotFound(ChunkType::IHDR.to_string()))?;
    let header = Header::parse(&ihdr.data)?;
    let gamma = read_gamma(&chunks)?;

    let palette = match header.color_type {
        ColorType::Indexed => {
            let plte = find(&chunks, ChunkType::PLTE)
                .ok_or_else(|| PngError::ChunkNotFound(ChunkType::PLTE.to_string()))?;
            if plte.data.len() % 3 != 0 {
                return Err(PngError::invalid(
                    "PLTE",
                    format!("length {} is not a multiple of 3", plte.data.len()),
                ));
            }
            Some(plte.data.as_slice())
        }
        _ => None,
    };

    let compressed: Vec<u8> = chunks
        .iter()
        .filter(|c| c.chunk_type == ChunkType::IDAT)
        .flat_map(|c| c.data.iter().copied())
        .collect();
    if compressed.is_empty() {
        return Err(PngError::ChunkNotFound(ChunkType::IDAT.to_string()));
    }

    // Anything past the stream the header describes is ignored
    let stream_len = header
        .stream_len()
        .ok_or_else(|| PngError::invalid("IHDR", "image is too large"))?;
    let mut inflated = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(stream_len as u64)
        .read_to_end(&mut inflated)
        .map_err(|e| PngError::invalid("IDAT", format!("inflate failed: {e}")))?;

    let width = header.width as usize;
    let height = header.height as usize;
    let samples = defilter(
        &inflated,
        width,
        height,
        header.color_type.bytes_per_pixel(),
    )?;

    let (channels, data) = match (header.color_type, palette) {
        (ColorType::Indexed, Some(palette)) => (3, expand_palette(&samples, palette)?),
        (ColorType::Rgb, _) => (3, samples),
        _ => (1, samples),
    };
    let pixels = PixelBuffer::new(width, height, channels, data)
        .map_err(|e| PngError::invalid("IDAT", e.to_string()))?;

    tracing::debug!(width, height, channels, gamma, "decoded PNG");
    Ok(DecodedPng { pixels, gamma })
}

/// Encoder settings.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Filter applied to every scanline.
    pub filter: FilterType,
    /// Deflate level.
    pub compression: Compression,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            filter: FilterType::Paeth,
            compression: Compression::default(),
        }
    }
}

/// Encode 8-bit samples as a PNG with a `gAMA` chunk.
pub fn encode(pixels: &PixelBuffer<u8>, gamma: f64) -> Result<Vec<u8>, PngError> {
    encode_with(pixels, gamma, EncodeOptions::default())
}

/// Encode with explicit filter and compression settings.
///
/// Chunk order is `IHDR`, `gAMA`, one or more `IDAT` of at most
/// [`MAX_IDAT_SIZE`] bytes, `IEND`.
pub fn encode_with(
    pixels: &PixelBuffer<u8>,
    gamma: f64,
    options: EncodeOptions,
) -> Result<Vec<u8>, PngError> {
    let invalid_dims = || {
        PngError::invalid(
            "IHDR",
            format!("unsupported size {}x{}", pixels.width(), pixels.height()),
        )
    };
    let width = u32::try_from(pixels.width()).map_err(|_| invalid_dims())?;
    let height = u32::try_from(pixels.height()).map_err(|_| invalid_dims())?;
    if width == 0 || height == 0 {
        return Err(invalid_dims());
    }
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(PngError::invalid("gAMA", format!("gamma {gamma}")));
    }

    let color_type = if pixels.is_color() {
        ColorType::Rgb
    } else {
        ColorType::Grayscale
    };
    let header = Header {
        width,
        height,
        bit_depth: 8,
        color_type,
        compression: 0,
        filter_method: 0,
        interlace: 0,
    };

    let filtered = filter(
        pixels.as_slice(),
        pixels.width(),
        pixels.height(),
        pixels.channels(),
        options.filter,
    );
    let mut encoder = ZlibEncoder::new(Vec::new(), options.compression);
    encoder.write_all(&filtered)?;
    let compressed = encoder.finish()?;

    let scaled = gamma * GAMMA_SCALE;
    if !(1.0..=f64::from(u32::MAX)).contains(&scaled) {
        return Err(PngError::invalid("gAMA", format!("gamma {gamma} out of range")));
    }
    let gamma_raw = scaled as u32;
    let mut chunks = vec![
        Chunk::new(ChunkType::IHDR, header.to_bytes()),
        Chunk::new(ChunkType::gAMA, gamma_raw.to_be_bytes().to_vec()),
    ];
    chunks.extend(
        compressed
            .chunks(MAX_IDAT_SIZE)
            .map(|part| Chunk::new(ChunkType::IDAT, part.to_vec())),
    );
    chunks.push(Chunk::new(ChunkType::IEND, Vec::new()));

    let mut out = PNG_SIGNATURE.to_vec();
    for chunk in &chunks {
        out.extend(chunk::build(chunk));
    }
    tracing::debug!(
        width,
        height,
        idat_chunks = chunks.len() - 3,
        bytes = out.len(),
        "encoded PNG"
    );
    Ok(out)
}

/// Encode and write to `writer` in a single call, so a failed encode leaves
/// the destination untouched.
pub fn write_png<W: Write>(
    writer: &mut W,
    pixels: &PixelBuffer<u8>,
    gamma: f64,
) -> Result<(), PngError> {
    let bytes = encode(pixels, gamma)?;
    writer.write_all(&bytes)?;
    Ok(())
}
