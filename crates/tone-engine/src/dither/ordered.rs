//! Ordered (Bayer) dithering.

use std::sync::OnceLock;

use super::Quantizer;
use crate::buffer::PixelBuffer;

/// Side length of the threshold tile.
pub const TILE_SIZE: usize = 8;

type Tile = [[f64; TILE_SIZE]; TILE_SIZE];

/// Build a `2^depth` square tile by recursive 2x2 subdivision.
///
/// At level `k` each quadrant holds the previous tile plus an offset of
/// `0`, `2`, `3` or `1` over `4^k` (top-left, top-right, bottom-left,
/// bottom-right). Values are in `[0, 1)`.
fn bayer(depth: u32) -> Vec<Vec<f64>> {
    if depth == 0 {
        return vec![vec![0.0]];
    }
    let prev = bayer(depth - 1);
    let half = prev.len();
    let q = f64::from(4u32.pow(depth));
    let offsets = [[0.0, 2.0 / q], [3.0 / q, 1.0 / q]];

    let mut tile = vec![vec![0.0; half * 2]; half * 2];
    for (y, row) in tile.iter_mut().enumerate() {
        for (x, value) in row.iter_mut().enumerate() {
            *value = prev[y % half][x % half] + offsets[y / half][x / half];
        }
    }
    tile
}

/// The 8x8 threshold map, centered to `[-0.5, 0.5)`.
///
/// Built once per process.
pub fn threshold_tile() -> &'static Tile {
    static TILE: OnceLock<Tile> = OnceLock::new();
    TILE.get_or_init(|| {
        let raw = bayer(3);
        let mut tile = [[0.0; TILE_SIZE]; TILE_SIZE];
        for (dst, src) in tile.iter_mut().zip(&raw) {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s - 0.5;
            }
        }
        tile
    })
}

/// `round(pixel * q + threshold) / q` with the tile repeated over the image.
///
/// Every channel of a pixel sees the same threshold.
pub fn ordered(buffer: &PixelBuffer<f64>, quantizer: Quantizer) -> PixelBuffer<f64> {
    let tile = threshold_tile();
    let mut out = buffer.clone();
    for y in 0..buffer.height() {
        for x in 0..buffer.width() {
            let threshold = tile[y % TILE_SIZE][x % TILE_SIZE];
            for sample in out.pixel_mut(x, y) {
                let level = quantizer.level(quantizer.scale(*sample) + threshold);
                *sample = quantizer.unscale(level);
            }
        }
    }
    out
}
