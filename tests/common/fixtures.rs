//! Test fixtures and constants.

use tone_engine::PixelBuffer;

/// Plain gray map with a comment line, max value 15
pub const PLAIN_GRAY: &[u8] = b"P2\n# ramp\n4 2\n15\n0 5 10 15\n15 10 5 0\n";

/// Plain color map holding one red and one blue pixel
pub const PLAIN_COLOR: &[u8] = b"P3 2 1 255\n255 0 0  0 0 255\n";

/// Config with non-default dither and annotation settings
pub const CUSTOM_CONFIG: &str = r#"
default_gamma: 1.0
color_mode: hsv
dither:
  algorithm: ordered
  bits: 2
annotation:
  width: 2.0
  color: [1.0, 0.0, 0.0]
"#;

/// Horizontal RGB gradient with a different ramp per channel
pub fn gradient(width: usize, height: usize) -> PixelBuffer<u8> {
    PixelBuffer::from_fn(width, height, 3, |x, y, c| {
        let t = x as f64 / (width.max(2) - 1) as f64;
        let v = match c {
            0 => t,
            1 => 1.0 - t,
            _ => y as f64 / height.max(1) as f64,
        };
        (v * 255.0).round() as u8
    })
    .expect("valid gradient")
}

/// Solid square of one RGB color
pub fn solid(size: usize, rgb: [u8; 3]) -> PixelBuffer<u8> {
    PixelBuffer::from_fn(size, size, 3, |_, _, c| rgb[c]).expect("valid square")
}

/// Gray buffer from explicit samples
pub fn gray(width: usize, height: usize, samples: &[u8]) -> PixelBuffer<u8> {
    PixelBuffer::new(width, height, 1, samples.to_vec()).expect("valid gray buffer")
}
