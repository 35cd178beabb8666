//! Assertion helpers for tests.

use pretty_assertions::assert_eq;
use std::path::Path;
use std::process::Output;

use tone_engine::codec::PNG_SIGNATURE;
use tone_engine::PixelBuffer;

/// Assert the file at `path` starts with the PNG signature
pub fn assert_png_file(path: &Path) {
    let bytes = std::fs::read(path).expect("output file exists");
    assert!(
        bytes.starts_with(&PNG_SIGNATURE),
        "Expected PNG at {}, got {} bytes starting with {:?}",
        path.display(),
        bytes.len(),
        &bytes[..8.min(bytes.len())]
    );
}

/// Assert the file at `path` is a raw PNM with the given tag
pub fn assert_pnm_file(path: &Path, tag: &str) {
    let bytes = std::fs::read(path).expect("output file exists");
    assert_eq!(
        String::from_utf8_lossy(&bytes[..2.min(bytes.len())]),
        tag,
        "Unexpected PNM tag in {}",
        path.display()
    );
}

/// Assert width, height and channel count
pub fn assert_shape<T: Copy>(buffer: &PixelBuffer<T>, width: usize, height: usize, channels: usize) {
    assert_eq!(
        (buffer.width(), buffer.height(), buffer.channels()),
        (width, height, channels),
        "Unexpected buffer shape"
    );
}

/// Assert every sample is one of `levels`
pub fn assert_levels(samples: &[u16], levels: &[u16]) {
    let stray: Vec<u16> = samples.iter().copied().filter(|s| !levels.contains(s)).collect();
    assert!(stray.is_empty(), "Samples outside {levels:?}: {stray:?}");
}

/// Assert a CLI run succeeded, showing stderr on failure
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "Command failed with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}
