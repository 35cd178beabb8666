//! Chunk framing.
//!
//! A PNG stream is the 8-byte signature followed by chunks laid out as
//!
//! ```text
//! [length: u32 BE][type: 4 ASCII bytes][payload: length bytes][crc: u32 BE]
//! ```
//!
//! where the CRC covers type and payload. Parsing stops at the first `IEND`.

use std::fmt;
use std::str::FromStr;

use super::crc::Crc32;
use super::error::PngError;

/// The fixed 8-byte PNG signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Chunk tags this codec recognizes.
///
/// Only `IHDR`, `PLTE`, `IDAT`, `IEND`, `gAMA`, `sRGB` and `iCCP` carry
/// meaning for decoding; the rest are accepted and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum ChunkType {
    IHDR,
    PLTE,
    IDAT,
    IEND,
    bKGD,
    cHRM,
    gAMA,
    hIST,
    iCCP,
    iTXt,
    pHYs,
    sBIT,
    sPLT,
    sRGB,
    sTER,
    tEXt,
    tIME,
    tRNS,
    zTXt,
}

impl ChunkType {
    /// The 4-byte tag as it appears on the wire.
    pub fn tag(self) -> [u8; 4] {
        let name = self.as_str().as_bytes();
        [name[0], name[1], name[2], name[3]]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChunkType::IHDR => "IHDR",
            ChunkType::PLTE => "PLTE",
            ChunkType::IDAT => "IDAT",
            ChunkType::IEND => "IEND",
            ChunkType::bKGD => "bKGD",
            ChunkType::cHRM => "cHRM",
            ChunkType::gAMA => "gAMA",
            ChunkType::hIST => "hIST",
            ChunkType::iCCP => "iCCP",
            ChunkType::iTXt => "iTXt",
            ChunkType::pHYs => "pHYs",
            ChunkType::sBIT => "sBIT",
            ChunkType::sPLT => "sPLT",
            ChunkType::sRGB => "sRGB",
            ChunkType::sTER => "sTER",
            ChunkType::tEXt => "tEXt",
            ChunkType::tIME => "tIME",
            ChunkType::tRNS => "tRNS",
            ChunkType::zTXt => "zTXt",
        }
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChunkType {
    type Err = PngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "IHDR" => ChunkType::IHDR,
            "PLTE" => ChunkType::PLTE,
            "IDAT" => ChunkType::IDAT,
            "IEND" => ChunkType::IEND,
            "bKGD" => ChunkType::bKGD,
            "cHRM" => ChunkType::cHRM,
            "gAMA" => ChunkType::gAMA,
            "hIST" => ChunkType::hIST,
            "iCCP" => ChunkType::iCCP,
            "iTXt" => ChunkType::iTXt,
            "pHYs" => ChunkType::pHYs,
            "sBIT" => ChunkType::sBIT,
            "sPLT" => ChunkType::sPLT,
            "sRGB" => ChunkType::sRGB,
            "sTER" => ChunkType::sTER,
            "tEXt" => ChunkType::tEXt,
            "tIME" => ChunkType::tIME,
            "tRNS" => ChunkType::tRNS,
            "zTXt" => ChunkType::zTXt,
            other => return Err(PngError::UnknownChunkType(other.to_string())),
        };
        Ok(kind)
    }
}

/// One typed record of a PNG stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub chunk_type: ChunkType,
    pub data: Vec<u8>,
}

impl Chunk {
    pub fn new(chunk_type: ChunkType, data: Vec<u8>) -> Self {
        Self { chunk_type, data }
    }

    /// CRC-32 over type tag followed by payload.
    pub fn crc(&self) -> u32 {
        let mut hasher = Crc32::new();
        hasher.update(&self.chunk_type.tag());
        hasher.update(&self.data);
        hasher.finish()
    }
}

/// Bounds-checked big-endian reader over a byte slice.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u32_be(&mut self) -> Option<u32> {
        self.take(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }
}

/// Split a PNG byte stream into chunks.
///
/// Fails with [`PngError::Signature`] on a bad signature,
/// [`PngError::UnknownChunkType`] for a tag outside [`ChunkType`],
/// [`PngError::ChunkNotFound`]`("IEND")` if the stream runs out before an
/// end marker, and [`PngError::InvalidContent`] if a stored CRC does not
/// match. Bytes after `IEND` are ignored.
pub fn parse(bytes: &[u8]) -> Result<Vec<Chunk>, PngError> {
    let mut reader = Reader::new(bytes);
    let signature = reader.take(PNG_SIGNATURE.len()).unwrap_or(bytes);
    if signature != PNG_SIGNATURE {
        return Err(PngError::Signature(signature.to_vec()));
    }

    let mut chunks = Vec::new();
    loop {
        let Some(length) = reader.u32_be() else {
            return Err(PngError::ChunkNotFound(ChunkType::IEND.to_string()));
        };
        let Some(tag) = reader.take(4) else {
            return Err(PngError::ChunkNotFound(ChunkType::IEND.to_string()));
        };
        let name = String::from_utf8_lossy(tag).into_owned();
        let chunk_type: ChunkType = name.parse()?;

        let (Some(payload), Some(stored_crc)) = (reader.take(length as usize), reader.u32_be())
        else {
            return Err(PngError::ChunkNotFound(ChunkType::IEND.to_string()));
        };

        let chunk = Chunk::new(chunk_type, payload.to_vec());
        let computed = chunk.crc();
        if computed != stored_crc {
            return Err(PngError::invalid(
                &name,
                format!("crc mismatch (stored {stored_crc:08X}, computed {computed:08X})"),
            ));
        }
        tracing::trace!(chunk = %chunk_type, length, "parsed chunk");

        chunks.push(chunk);
        if chunk_type == ChunkType::IEND {
            return Ok(chunks);
        }
    }
}

/// Serialize one chunk with its length prefix and a fresh CRC.
pub fn build(chunk: &Chunk) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunk.data.len() + 12);
    out.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
    out.extend_from_slice(&chunk.chunk_type.tag());
    out.extend_from_slice(&chunk.data);
    out.extend_from_slice(&chunk.crc().to_be_bytes());
    out
}
