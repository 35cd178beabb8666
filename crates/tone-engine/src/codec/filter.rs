//! Scanline filtering.
//!
//! Each scanline of the decompressed stream is prefixed by one byte naming
//! the predictor used for that row. Reconstruction runs left-to-right and
//! top-to-bottom because every predictor reads already-reconstructed bytes:
//!
//! ```text
//!    c  b        c = up-left, b = up
//!    a  x        a = left (bytes_per_pixel back), x = current
//! ```
//!
//! Missing neighbors (first row, first pixel) read as 0. All arithmetic
//! wraps modulo 256.

use super::error::PngError;

/// Per-scanline predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum FilterType {
    None = 0,
    Sub = 1,
    Up = 2,
    Average = 3,
    #[default]
    Paeth = 4,
}

impl FilterType {
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];
}

impl TryFrom<u8> for FilterType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            other => Err(other),
        }
    }
}

/// Paeth predictor: pick the neighbor closest to `a + b - c`.
///
/// Ties resolve in the order `a`, `b`, `c`.
#[inline]
pub fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[inline]
fn predict(kind: FilterType, a: u8, b: u8, c: u8) -> u8 {
    match kind {
        FilterType::None => 0,
        FilterType::Sub => a,
        FilterType::Up => b,
        FilterType::Average => ((a as u16 + b as u16) / 2) as u8,
        FilterType::Paeth => paeth_predictor(a, b, c),
    }
}

/// Reverse the scanline filters of a decompressed image stream.
///
/// `data` holds `height` scanlines of `1 + width * bytes_per_pixel` bytes.
/// Filter kinds may differ from row to row. Returns the raw samples,
/// `width * height * bytes_per_pixel` bytes.
///
/// An unknown filter byte or a short stream aborts the decode with
/// [`PngError::InvalidContent`] on `IDAT`; dimensions whose stream size
/// does not fit in memory are reported on `IHDR`.
pub fn defilter(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> Result<Vec<u8>, PngError> {
    let (stride, expected) = width
        .checked_mul(bytes_per_pixel)
        .and_then(|stride| Some((stride, stride.checked_add(1)?.checked_mul(height)?)))
        .ok_or_else(|| {
            PngError::invalid(
                "IHDR",
                format!("{width}x{height} at {bytes_per_pixel} bytes per pixel is too large"),
            )
        })?;
    if data.len() < expected {
        return Err(PngError::invalid(
            "IDAT",
            format!("expected {expected} bytes of scanlines, got {}", data.len()),
        ));
    }

    let mut image = vec![0u8; stride * height];
    for row in 0..height {
        let line = &data[row * (stride + 1)..(row + 1) * (stride + 1)];
        let kind = FilterType::try_from(line[0]).map_err(|kind| {
            PngError::invalid("IDAT", format!("unknown filter type {kind} in row {row}"))
        })?;

        // Previous row is finished; split so it can be read while this row is written
        let (done, rest) = image.split_at_mut(row * stride);
        let prior = if row > 0 {
            Some(&done[(row - 1) * stride..])
        } else {
            None
        };
        let current = &mut rest[..stride];

        for i in 0..stride {
            let a = if i >= bytes_per_pixel {
                current[i - bytes_per_pixel]
            } else {
                0
            };
            let b = prior.map_or(0, |p| p[i]);
            let c = match prior {
                Some(p) if i >= bytes_per_pixel => p[i - bytes_per_pixel],
                _ => 0,
            };
            current[i] = line[1 + i].wrapping_add(predict(kind, a, b, c));
        }
    }
    Ok(image)
}

/// Apply one filter kind to every scanline of raw samples.
///
/// The structural inverse of [`defilter`]: predictors read the *raw*
/// neighbors and the prediction is subtracted instead of added. Output has
/// the filter byte prepended to each row.
pub fn filter(
    raw: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    kind: FilterType,
) -> Vec<u8> {
    let stride = width * bytes_per_pixel;
    debug_assert_eq!(raw.len(), stride * height);

    let mut out = Vec::with_capacity(height * (stride + 1));
    for row in 0..height {
        let current = &raw[row * stride..(row + 1) * stride];
        let prior = if row > 0 {
            Some(&raw[(row - 1) * stride..row * stride])
        } else {
            None
        };

        out.push(kind as u8);
        for i in 0..stride {
            let a = if i >= bytes_per_pixel {
                current[i - bytes_per_pixel]
            } else {
                0
            };
            let b = prior.map_or(0, |p| p[i]);
            let c = match prior {
                Some(p) if i >= bytes_per_pixel => p[i - bytes_per_pixel],
                _ => 0,
            };
            out.push(current[i].wrapping_sub(predict(kind, a, b, c)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize, bpp: usize) -> Vec<u8> {
        (0..width * height * bpp)
            .map(|i| ((i * 37 + (i / 7) * 11) % 256) as u8)
            .collect()
    }

    #[test]
    fn test_paeth_tie_break_order() {
        // All equal distances -> a wins
        assert_eq!(paeth_predictor(10, 10, 10), 10);
        // p = 20 + 10 - 10 = 20: pa = 0
        assert_eq!(paeth_predictor(20, 10, 10), 20);
        // p = 10 + 20 - 10 = 20: pb = 0
        assert_eq!(paeth_predictor(10, 20, 10), 20);
        // p = 5 + 5 - 10 = 0: pa = pb = 5, pc = 10 -> a
        assert_eq!(paeth_predictor(5, 5, 10), 5);
        // p = 0 + 10 - 5 = 5: pa = 5, pb = 5, pc = 0 -> c
        assert_eq!(paeth_predictor(0, 10, 5), 5);
    }

    #[test]
    fn test_round_trip_every_kind() {
        let (w, h, bpp) = (7, 5, 3);
        let raw = gradient(w, h, bpp);
        for kind in FilterType::ALL {
            let filtered = filter(&raw, w, h, bpp, kind);
            assert_eq!(filtered.len(), h * (w * bpp + 1));
            let restored = defilter(&filtered, w, h, bpp).unwrap();
            assert_eq!(restored, raw, "round trip failed for {kind:?}");
        }
    }

    #[test]
    fn test_mixed_kinds_per_row() {
        let (w, h, bpp) = (4, 5, 1);
        let raw = gradient(w, h, bpp);
        // Filter each row with a different kind, splicing rows together
        let mut mixed = Vec::new();
        for (row, kind) in FilterType::ALL.iter().enumerate() {
            let all = filter(&raw, w, h, bpp, *kind);
            mixed.extend_from_slice(&all[row * (w + 1)..(row + 1) * (w + 1)]);
        }
        assert_eq!(defilter(&mixed, w, h, bpp).unwrap(), raw);
    }

    #[test]
    fn test_sub_reconstruction_by_hand() {
        // One row, 1 byte per pixel, Sub: 10, +5, +250 (wraps)
        let data = [1u8, 10, 5, 250];
        assert_eq!(defilter(&data, 3, 1, 1).unwrap(), vec![10, 15, 9]);
    }

    #[test]
    fn test_average_floors() {
        // Row 0 None [3], row 1 Average: (0 + 3) / 2 = 1, stored 1 -> 2
        let data = [0u8, 3, 3, 1];
        assert_eq!(defilter(&data, 1, 2, 1).unwrap(), vec![3, 2]);
    }

    #[test]
    fn test_unknown_filter_type_is_fatal() {
        let data = [5u8, 0, 0];
        let err = defilter(&data, 2, 1, 1).unwrap_err();
        assert!(err.to_string().contains("unknown filter type 5"));
    }

    #[test]
    fn test_short_stream_rejected() {
        let data = [0u8, 1, 2];
        assert!(defilter(&data, 3, 1, 1).is_err());
    }

    #[test]
    fn test_unaddressable_dimensions_rejected() {
        let data = [0u8, 1, 2];
        for (width, height, bpp) in [(usize::MAX, 1, 3), (usize::MAX / 2, 3, 1), (1, usize::MAX, 3)] {
            let err = defilter(&data, width, height, bpp).unwrap_err();
            assert!(
                matches!(err, PngError::InvalidContent { ref chunk, .. } if chunk == "IHDR"),
                "{width}x{height}x{bpp}: {err}"
            );
        }
    }

    #[test]
    fn test_dimensions_larger_than_payload_rejected() {
        let data = [0u8; 16];
        let err = defilter(&data, 100_000, 100_000, 3).unwrap_err();
        assert!(matches!(err, PngError::InvalidContent { ref chunk, .. } if chunk == "IDAT"));
    }
}
