use thiserror::Error;
use tone_engine::{BufferError, DitherError, PngError};

/// Failures reading or writing the plain (PNM) raster format.
#[derive(Debug, Error)]
pub enum PnmError {
    #[error("Error opening file {0}")]
    FileOpen(String),

    #[error("Unknown tag {0}")]
    UnknownTag(String),

    /// A header part (`width`, `height`, `max value`) is malformed.
    #[error("Invalid {0}")]
    Format(&'static str),

    #[error("Invalid image ({0})")]
    Data(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Pnm(#[from] PnmError),

    #[error(transparent)]
    Png(#[from] PngError),

    #[error("Dither error: {0}")]
    Dither(#[from] DitherError),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
