//! Sequential error diffusion.

use super::kernel::Kernel;
use super::Quantizer;
use crate::buffer::PixelBuffer;

/// Sliding window of pending error rows.
///
/// Only the rows the kernel can reach are stored: `rows[0]` is the current
/// row, `rows[1]` the next, and so on. Each row holds `width * channels`
/// interleaved values.
#[derive(Debug)]
pub struct ErrorBuffer {
    rows: Vec<Vec<f64>>,
    width: usize,
    channels: usize,
}

impl ErrorBuffer {
    /// `row_depth` is the kernel's `max_dy + 1`.
    pub fn new(width: usize, channels: usize, row_depth: usize) -> Self {
        Self {
            rows: (0..row_depth).map(|_| vec![0.0; width * channels]).collect(),
            width,
            channels,
        }
    }

    /// Error accumulated so far for sample `c` of pixel `x` in the current row.
    #[inline]
    pub fn accumulated(&self, x: usize, c: usize) -> f64 {
        self.rows[0][x * self.channels + c]
    }

    /// Add error to a future pixel.
    ///
    /// Out-of-bounds targets are dropped.
    #[inline]
    pub fn add_error(&mut self, x: isize, row_offset: usize, c: usize, error: f64) {
        if x < 0 || x as usize >= self.width || row_offset >= self.rows.len() {
            return;
        }
        self.rows[row_offset][x as usize * self.channels + c] += error;
    }

    /// Discard the current row and open an empty one at the far end.
    pub fn advance_row(&mut self) {
        // Rotate left: [0,1,2] -> [1,2,0]
        self.rows.rotate_left(1);
        if let Some(last) = self.rows.last_mut() {
            last.fill(0.0);
        }
    }
}

/// Quantize `buffer` by error diffusion with `kernel`.
///
/// Pixels are visited in row-major order. Each one gets the error pushed to
/// it by earlier pixels, is rounded to the nearest level in `[0, q]`, and
/// hands its residual (value before rounding minus chosen level) to the
/// kernel's neighbors. Error rows below the image are dropped.
///
/// Every output depends on all previously visited pixels, so this loop
/// must not be split across threads or reordered.
pub fn diffuse(buffer: &PixelBuffer<f64>, quantizer: Quantizer, kernel: &Kernel) -> PixelBuffer<f64> {
    let (width, height, channels) = (buffer.width(), buffer.height(), buffer.channels());
    let mut out = buffer.clone();
    let mut errors = ErrorBuffer::new(width, channels, kernel.max_dy + 1);
    let divisor = f64::from(kernel.divisor);

    for y in 0..height {
        for x in 0..width {
            let pixel = out.pixel_mut(x, y);
            for (c, sample) in pixel.iter_mut().enumerate() {
                let value = quantizer.scale(*sample) + errors.accumulated(x, c);
                let level = quantizer.level(value);
                *sample = quantizer.unscale(level);

                let residual = value - level;
                if residual == 0.0 {
                    continue;
                }
                for &(dx, dy, weight) in kernel.entries {
                    let share = residual * f64::from(weight) / divisor;
                    errors.add_error(x as isize + dx as isize, dy as usize, c, share);
                }
            }
        }
        errors.advance_row();
    }
    out
}
