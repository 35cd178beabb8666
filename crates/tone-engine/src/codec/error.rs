//! Error type for the PNG codec.

use thiserror::Error;

/// Structured PNG decode/encode failures.
///
/// Every variant carries the offending tag, chunk or field so callers can
/// render a message without re-parsing the input.
#[derive(Debug, Error)]
pub enum PngError {
    /// The leading eight bytes are not the PNG signature.
    #[error("Invalid signature {0:02X?}")]
    Signature(Vec<u8>),

    /// A chunk tag outside the known set.
    #[error("Unknown chunk type {0}")]
    UnknownChunkType(String),

    /// A required chunk is missing (including a stream without `IEND`).
    #[error("File does not have {0} chunk")]
    ChunkNotFound(String),

    /// A chunk is present but its content is unusable.
    #[error("Invalid content of chunk {chunk}: {content}")]
    InvalidContent { chunk: String, content: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PngError {
    pub(crate) fn invalid(chunk: &str, content: impl Into<String>) -> Self {
        PngError::InvalidContent {
            chunk: chunk.to_string(),
            content: content.into(),
        }
    }
}
