//! CRC-32 checksums for chunk integrity.
//!
//! Standard reflected CRC-32 (polynomial `0xEDB88320`, initial value and
//! final XOR `0xFFFFFFFF`). The byte table is generated at compile time by
//! `build.rs`.

// Include the generated table from build.rs
include!(concat!(env!("OUT_DIR"), "/crc_table.rs"));

/// Incremental CRC-32 state.
///
/// Chunk checksums cover the type tag followed by the payload, which live in
/// separate slices; feeding them through one hasher avoids concatenating.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    state: u32,
}

impl Crc32 {
    #[inline]
    pub fn new() -> Self {
        Self { state: 0xFFFF_FFFF }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        let mut c = self.state;
        for &byte in bytes {
            c = CRC_TABLE[((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
        }
        self.state = c;
    }

    #[inline]
    pub fn finish(self) -> u32 {
        self.state ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC-32 of a complete byte sequence.
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(bytes);
    hasher.finish()
}
