//! Random-threshold dithering.

use rand::Rng;

use super::Quantizer;
use crate::buffer::PixelBuffer;

/// `round(pixel * q + noise) / q` with uniform noise in `[-0.5, 0.5)`.
///
/// With `sync_channels` one noise value is drawn per pixel and shared by all
/// its channels; otherwise every sample draws its own.
pub fn random<R: Rng>(
    buffer: &PixelBuffer<f64>,
    quantizer: Quantizer,
    sync_channels: bool,
    rng: &mut R,
) -> PixelBuffer<f64> {
    let mut out = buffer.clone();
    let channels = out.channels();
    for pixel in out.as_mut_slice().chunks_exact_mut(channels) {
        let shared = rng.gen::<f64>() - 0.5;
        for (c, sample) in pixel.iter_mut().enumerate() {
            let noise = if sync_channels || c == 0 {
                shared
            } else {
                rng.gen::<f64>() - 0.5
            };
            let level = quantizer.level(quantizer.scale(*sample) + noise);
            *sample = quantizer.unscale(level);
        }
    }
    out
}
