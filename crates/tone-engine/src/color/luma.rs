//! Luma/chroma models as fixed 3x3 linear transforms.
//!
//! The YCbCr variants differ only in their luma weights (BT.601 vs BT.709).
//! Chroma is unbiased, so Cb/Cr fall in `[-0.5, 0.5]`. YCoCg is the
//! average/difference transform used by lifting-based codecs; its inverse
//! needs no multiplications.

pub type Mat3 = [[f64; 3]; 3];

/// Luma weights `(Kr, Kb)`; `Kg = 1 - Kr - Kb`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LumaWeights {
    pub kr: f64,
    pub kb: f64,
}

pub const BT601: LumaWeights = LumaWeights {
    kr: 0.299,
    kb: 0.114,
};

pub const BT709: LumaWeights = LumaWeights {
    kr: 0.2126,
    kb: 0.0722,
};

impl LumaWeights {
    #[inline]
    fn kg(self) -> f64 {
        1.0 - self.kr - self.kb
    }

    /// RGB -> YCbCr.
    pub fn forward(self) -> Mat3 {
        let (kr, kg, kb) = (self.kr, self.kg(), self.kb);
        let cb = 2.0 * (1.0 - kb);
        let cr = 2.0 * (1.0 - kr);
        [
            [kr, kg, kb],
            [-kr / cb, -kg / cb, (1.0 - kb) / cb],
            [(1.0 - kr) / cr, -kg / cr, -kb / cr],
        ]
    }

    /// YCbCr -> RGB.
    pub fn inverse(self) -> Mat3 {
        let (kr, kg, kb) = (self.kr, self.kg(), self.kb);
        [
            [1.0, 0.0, 2.0 * (1.0 - kr)],
            [
                1.0,
                -2.0 * kb * (1.0 - kb) / kg,
                -2.0 * kr * (1.0 - kr) / kg,
            ],
            [1.0, 2.0 * (1.0 - kb), 0.0],
        ]
    }
}

pub const YCOCG_FORWARD: Mat3 = [
    [0.25, 0.5, 0.25],
    [0.5, 0.0, -0.5],
    [-0.25, 0.5, -0.25],
];

pub const YCOCG_INVERSE: Mat3 = [
    [1.0, 1.0, -1.0],
    [1.0, 0.0, 1.0],
    [1.0, -1.0, -1.0],
];

#[inline]
pub fn apply(m: &Mat3, [a, b, c]: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * a + m[0][1] * b + m[0][2] * c,
        m[1][0] * a + m[1][1] * b + m[1][2] * c,
        m[2][0] * a + m[2][1] * b + m[2][2] * c,
    ]
}
