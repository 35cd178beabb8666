//! Interleaved pixel buffers.
//!
//! [`PixelBuffer`] is the one image container shared by every stage of the
//! engine. Samples are stored row-major with channels interleaved, so a
//! 3-channel pixel at `(x, y)` occupies `data[(y * width + x) * 3..][..3]`.
//!
//! Two sample types are used in practice:
//!
//! - `u8` (and `u16` for 16-bit PNM input): the on-disk representation
//! - `f64` in `[0, 1]`: the working representation for color math,
//!   dithering and leveling

use thiserror::Error;

/// Shape violations when constructing or combining buffers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// Only grayscale (1) and color (3) buffers exist.
    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannels(usize),

    /// Sample vector does not match `width * height * channels`.
    #[error("buffer length {actual} does not match {width}x{height}x{channels}")]
    LengthMismatch {
        width: usize,
        height: usize,
        channels: usize,
        actual: usize,
    },

    /// Two buffers that must share extent do not.
    #[error("size mismatch: {0}x{1} vs {2}x{3}")]
    SizeMismatch(usize, usize, usize, usize),
}

/// A `height x width x channels` image with interleaved samples.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer<T> {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<T>,
}

impl<T: Copy> PixelBuffer<T> {
    /// Wrap an existing sample vector.
    ///
    /// Fails if `channels` is not 1 or 3, or if the vector length does not
    /// equal `width * height * channels`.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<T>,
    ) -> Result<Self, BufferError> {
        if channels != 1 && channels != 3 {
            return Err(BufferError::UnsupportedChannels(channels));
        }
        if data.len() != width * height * channels {
            return Err(BufferError::LengthMismatch {
                width,
                height,
                channels,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// A buffer with every sample set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        channels: usize,
        value: T,
    ) -> Result<Self, BufferError> {
        Self::new(width, height, channels, vec![value; width * height * channels])
    }

    /// Build a buffer by evaluating `f(x, y, channel)` for every sample.
    pub fn from_fn(
        width: usize,
        height: usize,
        channels: usize,
        mut f: impl FnMut(usize, usize, usize) -> T,
    ) -> Result<Self, BufferError> {
        let mut data = Vec::with_capacity(width * height * channels);
        for y in 0..height {
            for x in 0..width {
                for c in 0..channels {
                    data.push(f(x, y, c));
                }
            }
        }
        Self::new(width, height, channels, data)
    }

    /// Single-channel buffer from samples whose length the caller built
    /// as `width * height`.
    pub(crate) fn gray_from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            width,
            height,
            channels: 1,
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of pixels (not samples).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_color(&self) -> bool {
        self.channels == 3
    }

    /// All samples, row-major, channels interleaved.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Samples of the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the buffer.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let start = (y * self.width + x) * self.channels;
        &self.data[start..start + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [T] {
        let start = (y * self.width + x) * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// Iterate over pixels as channel slices in row-major order.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, T> {
        self.data.chunks_exact(self.channels)
    }

    /// Apply `f` to every sample, keeping the shape.
    pub fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> PixelBuffer<U> {
        PixelBuffer {
            width: self.width,
            height: self.height,
            channels: self.channels,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Extract channel `index` as a single-channel buffer.
    ///
    /// # Panics
    ///
    /// Panics if `index >= channels`.
    pub fn channel(&self, index: usize) -> PixelBuffer<T> {
        assert!(
            index < self.channels,
            "channel {index} out of range for {}-channel buffer",
            self.channels
        );
        PixelBuffer {
            width: self.width,
            height: self.height,
            channels: 1,
            data: self.pixels().map(|p| p[index]).collect(),
        }
    }

    /// Replicate a grayscale buffer into three identical channels.
    ///
    /// Color buffers are returned unchanged.
    pub fn expand_gray(&self) -> PixelBuffer<T> {
        if self.channels == 3 {
            return self.clone();
        }
        PixelBuffer {
            width: self.width,
            height: self.height,
            channels: 3,
            data: self.data.iter().flat_map(|&v| [v, v, v]).collect(),
        }
    }
}

/// Scale integer samples to `[0, 1]` by dividing by `max_value`.
pub fn normalize<T: Copy + Into<f64>>(buffer: &PixelBuffer<T>, max_value: u32) -> PixelBuffer<f64> {
    let max = f64::from(max_value.max(1));
    buffer.map(|v| v.into() / max)
}

/// Quantize a `[0, 1]` buffer to 8-bit samples.
///
/// Values are scaled by 255, rounded half-to-even and clamped, so slightly
/// out-of-range results of color math never wrap.
pub fn to_8bit(buffer: &PixelBuffer<f64>) -> PixelBuffer<u8> {
    buffer.map(|v| (v * 255.0).round_ties_even().clamp(0.0, 255.0) as u8)
}
