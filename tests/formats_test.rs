//! Format detection and decode errors seen through files on disk.

mod common;

use pretty_assertions::assert_eq;
use tone_engine::ColorMode;

use common::{fixtures, TestWorkspace};
use tonekit::error::{AppError, PnmError};
use tonekit::formats::ImageFormat;

#[test]
fn test_plain_color_map_samples() {
    let ws = TestWorkspace::new();
    let path = ws.write_bytes("two.ppm", fixtures::PLAIN_COLOR);

    let raw = ws.read(&path);

    assert_eq!(raw.format, ImageFormat::Pnm);
    assert_eq!(raw.samples.as_slice(), &[255, 0, 0, 0, 0, 255]);
    assert_eq!(raw.gamma, None);
}

#[test]
fn test_sixteen_bit_map_normalizes() {
    let ws = TestWorkspace::new();
    let mut bytes = b"P5\n2 1\n65535\n".to_vec();
    bytes.extend_from_slice(&[0xFF, 0xFF, 0x00, 0x00]);
    let path = ws.write_bytes("deep.pgm", &bytes);

    let loaded = ws.pipeline.load(&path, ColorMode::Rgb).unwrap();
    let rgb = loaded.image.get(ColorMode::Rgb);

    assert_eq!(rgb.as_slice(), &[1.0, 0.0]);
}

#[test]
fn test_magic_wins_over_extension() {
    let ws = TestWorkspace::new();
    // A gray map saved with a .png name is still read as PNM
    let path = ws.write_bytes("misnamed.png", fixtures::PLAIN_GRAY);

    assert_eq!(ws.read(&path).format, ImageFormat::Pnm);
}

#[test]
fn test_corrupt_png_signature() {
    let ws = TestWorkspace::new();
    let path = ws.write_bytes("broken.png", b"\x89PNX\r\n\x1a\n");

    let err = ws.pipeline.load(&path, ColorMode::Rgb).unwrap_err();

    assert!(matches!(err, AppError::Png(_)));
    assert!(err.to_string().starts_with("Invalid signature"));
}

#[test]
fn test_pnm_error_messages() {
    let ws = TestWorkspace::new();
    let cases: [(&str, &[u8], &str); 3] = [
        ("tag.pgm", b"P4 1 1\n\0", "Unknown tag P4"),
        ("width.pgm", b"P5 -1 1 255\n\0", "Invalid width"),
        (
            "short.pgm",
            b"P5 2 2 255\n\0",
            "Invalid image (truncated pixel data: expected 4 bytes, got 1)",
        ),
    ];

    for (name, bytes, message) in cases {
        let path = ws.write_bytes(name, bytes);
        let err = ws.pipeline.load(&path, ColorMode::Rgb).unwrap_err();
        assert!(matches!(err, AppError::Pnm(_)), "{name}");
        assert_eq!(err.to_string(), message);
    }
}

#[test]
fn test_pnm_file_open_variant() {
    let ws = TestWorkspace::new();
    let err = tonekit::formats::read(&ws.path("nope.pgm")).unwrap_err();
    assert!(matches!(err, AppError::Pnm(PnmError::FileOpen(_))));
}
