//! Error diffusion kernel definitions.
//!
//! Each kernel specifies how the quantization residual of one pixel is
//! spread over neighbors that have not been visited yet.

/// An error diffusion kernel.
///
/// Each entry is an offset `(dx, dy)` and a weight. A neighbor receives
/// `residual * weight / divisor`.
///
/// # Buffer Sizing
///
/// `max_dy` is how many rows ahead the kernel reaches; the error buffer
/// keeps `max_dy + 1` rows.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    /// (dx, dy, weight) entries.
    ///
    /// - `dx`: horizontal offset (positive = right)
    /// - `dy`: vertical offset (0 = current row, positive = below)
    /// - `weight`: numerator, the divisor is separate
    pub entries: &'static [(i32, i32, u8)],

    pub divisor: u8,

    /// Maximum dy value in entries.
    pub max_dy: usize,
}

impl Kernel {
    /// Fraction of the residual the kernel passes on.
    pub fn propagation(&self) -> f64 {
        let sum: u32 = self.entries.iter().map(|&(_, _, w)| u32::from(w)).sum();
        f64::from(sum) / f64::from(self.divisor)
    }
}

/// Floyd-Steinberg kernel: 4 neighbors, 100% propagation (16/16).
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[
        (1, 0, 7),  // right
        (-1, 1, 3), // bottom-left
        (0, 1, 5),  // bottom
        (1, 1, 1),  // bottom-right
    ],
    divisor: 16,
    max_dy: 1,
};

/// Atkinson kernel: 6 neighbors at 1/8 each, 75% propagation.
///
/// The lost quarter keeps highlights and shadows from smearing.
///
/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: &[
        (1, 0, 1),  // right
        (2, 0, 1),  // two right
        (-1, 1, 1), // bottom-left
        (0, 1, 1),  // bottom
        (1, 1, 1),  // bottom-right
        (0, 2, 1),  // two below
    ],
    divisor: 8,
    max_dy: 2,
};
