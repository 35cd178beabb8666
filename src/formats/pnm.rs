//! Netpbm gray and color maps (`P2`, `P3`, `P5`, `P6`).
//!
//! Decoding accepts both the plain (ASCII) and raw (binary) variants with
//! `#` comments in the header. Raw samples are one byte when the max value
//! is below 256 and two big-endian bytes otherwise. Encoding always writes
//! the raw variant.

use tone_engine::PixelBuffer;

use crate::error::PnmError;

/// Largest max value the format allows.
pub const MAX_VALUE_LIMIT: u32 = 65535;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    PlainGray,
    PlainColor,
    RawGray,
    RawColor,
}

impl Variant {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"P2" => Some(Variant::PlainGray),
            b"P3" => Some(Variant::PlainColor),
            b"P5" => Some(Variant::RawGray),
            b"P6" => Some(Variant::RawColor),
            _ => None,
        }
    }

    fn channels(self) -> usize {
        match self {
            Variant::PlainGray | Variant::RawGray => 1,
            Variant::PlainColor | Variant::RawColor => 3,
        }
    }

    fn is_raw(self) -> bool {
        matches!(self, Variant::RawGray | Variant::RawColor)
    }
}

/// Header tokenizer that skips whitespace and `#` comments.
struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn skip_separators(&mut self) {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'#' {
                while self.bytes.get(self.pos).is_some_and(|&b| b != b'\n') {
                    self.pos += 1;
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Option<&'a [u8]> {
        self.skip_separators();
        let start = self.pos;
        while self
            .bytes
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace() && *b != b'#')
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.bytes[start..self.pos])
    }

    fn number(&mut self) -> Option<u32> {
        std::str::from_utf8(self.next_token()?).ok()?.parse().ok()
    }
}

/// Decode a PNM image into samples and their max value.
pub fn decode(bytes: &[u8]) -> Result<(PixelBuffer<u16>, u32), PnmError> {
    let tag = bytes.get(..2).unwrap_or(bytes);
    let variant = Variant::from_tag(tag)
        .ok_or_else(|| PnmError::UnknownTag(String::from_utf8_lossy(tag).into_owned()))?;

    let mut tokens = Tokens { bytes, pos: 2 };
    let width = tokens.number().filter(|&w| w > 0).ok_or(PnmError::Format("width"))? as usize;
    let height = tokens.number().filter(|&h| h > 0).ok_or(PnmError::Format("height"))? as usize;
    let max_value = tokens
        .number()
        .filter(|m| (1..=MAX_VALUE_LIMIT).contains(m))
        .ok_or(PnmError::Format("max value"))?;

    let channels = variant.channels();
    let expected = width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(channels))
        .ok_or(PnmError::Format("dimensions"))?;
    let samples = if variant.is_raw() {
        // Exactly one whitespace byte separates the header from the raster
        let raster = bytes.get(tokens.pos + 1..).unwrap_or(&[]);
        read_raw(raster, expected, max_value)?
    } else {
        read_plain(&mut tokens, expected)?
    };

    if let Some(i) = samples.iter().position(|&s| u32::from(s) > max_value) {
        return Err(PnmError::Data(format!(
            "sample {i} is {} but max value is {max_value}",
            samples[i]
        )));
    }
    tracing::debug!(width, height, channels, max_value, "decoded PNM");

    let buffer = PixelBuffer::new(width, height, channels, samples)
        .map_err(|e| PnmError::Data(e.to_string()))?;
    Ok((buffer, max_value))
}

fn read_raw(raster: &[u8], expected: usize, max_value: u32) -> Result<Vec<u16>, PnmError> {
    let wide = max_value > 255;
    let needed = if wide { expected.checked_mul(2) } else { Some(expected) };
    let Some(needed) = needed.filter(|&n| n <= raster.len()) else {
        return Err(PnmError::Data(format!(
            "truncated pixel data: expected {} bytes, got {}",
            expected.saturating_mul(if wide { 2 } else { 1 }),
            raster.len()
        )));
    };
    let samples = if wide {
        raster[..needed]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    } else {
        raster[..needed].iter().map(|&b| u16::from(b)).collect()
    };
    Ok(samples)
}

fn read_plain(tokens: &mut Tokens<'_>, expected: usize) -> Result<Vec<u16>, PnmError> {
    // Every sample takes at least one byte of input
    let mut samples = Vec::with_capacity(expected.min(tokens.bytes.len()));
    while samples.len() < expected {
        let Some(token) = tokens.next_token() else {
            return Err(PnmError::Data(format!(
                "expected {expected} samples, got {}",
                samples.len()
            )));
        };
        let value = std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(|| {
                PnmError::Data(format!(
                    "sample {} is not a number: {}",
                    samples.len(),
                    String::from_utf8_lossy(token)
                ))
            })?;
        samples.push(value);
    }
    Ok(samples)
}

/// Encode samples as raw `P5` (gray) or `P6` (color).
pub fn encode<T: Copy + Into<u16>>(
    buffer: &PixelBuffer<T>,
    max_value: u32,
) -> Result<Vec<u8>, PnmError> {
    if !(1..=MAX_VALUE_LIMIT).contains(&max_value) {
        return Err(PnmError::Format("max value"));
    }
    let tag = if buffer.is_color() { "P6" } else { "P5" };
    let mut out = format!(
        "{tag}\n{} {}\n{max_value}\n",
        buffer.width(),
        buffer.height()
    )
    .into_bytes();

    let wide = max_value > 255;
    out.reserve(buffer.as_slice().len() * if wide { 2 } else { 1 });
    for (i, &sample) in buffer.as_slice().iter().enumerate() {
        let value: u16 = sample.into();
        if u32::from(value) > max_value {
            return Err(PnmError::Data(format!(
                "sample {i} is {value} but max value is {max_value}"
            )));
        }
        if wide {
            out.extend_from_slice(&value.to_be_bytes());
        } else {
            out.push(value as u8);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_gray_with_comments() {
        let data = b"P2\n# made by hand\n3 2 # width height\n15\n0 5 10\n15 # trailing\n 7 1\n";
        let (buffer, max) = decode(data).unwrap();
        assert_eq!(max, 15);
        assert_eq!((buffer.width(), buffer.height(), buffer.channels()), (3, 2, 1));
        assert_eq!(buffer.as_slice(), &[0, 5, 10, 15, 7, 1]);
    }

    #[test]
    fn test_decode_plain_color() {
        let (buffer, max) = decode(b"P3 1 1 255 10 20 30").unwrap();
        assert_eq!(max, 255);
        assert_eq!(buffer.pixel(0, 0), &[10, 20, 30]);
    }

    #[test]
    fn test_decode_raw_color() {
        let mut data = b"P6\n2 1\n255\n".to_vec();
        data.extend_from_slice(&[1, 2, 3, 250, 251, 252]);
        let (buffer, _) = decode(&data).unwrap();
        assert_eq!(buffer.as_slice(), &[1, 2, 3, 250, 251, 252]);
    }

    #[test]
    fn test_decode_raw_sixteen_bit() {
        let mut data = b"P5 2 1 1023\n".to_vec();
        data.extend_from_slice(&[0x03, 0xFF, 0x00, 0x10]);
        let (buffer, max) = decode(&data).unwrap();
        assert_eq!(max, 1023);
        assert_eq!(buffer.as_slice(), &[1023, 16]);
    }

    #[test]
    fn test_raw_raster_may_start_with_whitespace_byte() {
        // 0x20 and 0x0A are valid sample values right after the separator
        let mut data = b"P5 2 1 255\n".to_vec();
        data.extend_from_slice(&[0x20, 0x0A]);
        let (buffer, _) = decode(&data).unwrap();
        assert_eq!(buffer.as_slice(), &[0x20, 0x0A]);
    }

    #[test]
    fn test_unknown_tag() {
        let err = decode(b"P7\n1 1\n255\n\0").unwrap_err();
        assert_eq!(err.to_string(), "Unknown tag P7");
        assert!(matches!(decode(b"").unwrap_err(), PnmError::UnknownTag(_)));
    }

    #[test]
    fn test_malformed_header_parts() {
        assert_eq!(decode(b"P2 x 1 255").unwrap_err().to_string(), "Invalid width");
        assert_eq!(decode(b"P2 1 0 255").unwrap_err().to_string(), "Invalid height");
        assert_eq!(decode(b"P2 1 1 0").unwrap_err().to_string(), "Invalid max value");
        assert_eq!(decode(b"P2 1 1 70000").unwrap_err().to_string(), "Invalid max value");
    }

    #[test]
    fn test_truncated_and_out_of_range_data() {
        assert!(matches!(decode(b"P2 2 1 255 1"), Err(PnmError::Data(_))));
        assert!(matches!(decode(b"P5 2 1 255\n\x01"), Err(PnmError::Data(_))));
        let err = decode(b"P2 1 1 10 11").unwrap_err();
        assert_eq!(err.to_string(), "Invalid image (sample 0 is 11 but max value is 10)");
        assert!(matches!(decode(b"P2 1 1 10 abc"), Err(PnmError::Data(_))));
    }

    #[test]
    fn test_overflowing_dimensions() {
        for data in [
            &b"P3 4294967295 4294967295 255 1"[..],
            b"P6 4294967295 4294967295 255\n\x01",
        ] {
            let err = decode(data).unwrap_err();
            assert_eq!(err.to_string(), "Invalid dimensions");
        }
        // The gray product fits; the missing samples are reported without
        // reserving room for them
        let err = decode(b"P2 4294967295 4294967295 255 1").unwrap_err();
        assert!(matches!(err, PnmError::Data(_) | PnmError::Format("dimensions")), "{err}");
    }

    #[test]
    fn test_dimensions_larger_than_payload() {
        let err = decode(b"P3 60000 60000 255 1").unwrap_err();
        assert_eq!(err.to_string(), "Invalid image (expected 10800000000 samples, got 1)");

        let err = decode(b"P5 60000 60000 65535\n\x01\x02").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid image (truncated pixel data: expected 7200000000 bytes, got 2)"
        );
    }

    #[test]
    fn test_encode_then_decode() {
        let buffer = PixelBuffer::from_fn(3, 2, 3, |x, y, c| (x * 40 + y * 7 + c) as u8).unwrap();
        let bytes = encode(&buffer, 255).unwrap();
        assert!(bytes.starts_with(b"P6\n3 2\n255\n"));
        let (decoded, max) = decode(&bytes).unwrap();
        assert_eq!(max, 255);
        assert_eq!(decoded, buffer.map(u16::from));
    }

    #[test]
    fn test_encode_gray_wide() {
        let buffer = PixelBuffer::new(2, 1, 1, vec![300u16, 2]).unwrap();
        let bytes = encode(&buffer, 1000).unwrap();
        assert_eq!(bytes, b"P5\n2 1\n1000\n\x01\x2C\x00\x02");
    }

    #[test]
    fn test_encode_rejects_sample_above_max() {
        let buffer = PixelBuffer::new(1, 1, 1, vec![20u8]).unwrap();
        assert!(matches!(encode(&buffer, 10), Err(PnmError::Data(_))));
        assert!(matches!(encode(&buffer, 0), Err(PnmError::Format("max value"))));
    }
}
