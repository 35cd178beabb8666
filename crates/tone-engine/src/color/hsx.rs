//! Hue-based models: HSL and HSV.
//!
//! Hue is normalized to `[0, 1)` rather than degrees. Both forward
//! transforms share the hue computation; they differ only in how the
//! second and third components are derived from the channel extremes.

/// Hue from the dominant channel, six-sector formula.
///
/// Achromatic input (`delta == 0`) has hue 0.
#[inline]
fn hue(r: f64, g: f64, b: f64, max: f64, delta: f64) -> f64 {
    if delta == 0.0 {
        return 0.0;
    }
    let sector = if max == r {
        (g - b) / delta
    } else if max == g {
        (b - r) / delta + 2.0
    } else {
        (r - g) / delta + 4.0
    };
    (sector / 6.0).rem_euclid(1.0)
}

#[inline]
fn extremes([r, g, b]: [f64; 3]) -> (f64, f64) {
    (r.min(g).min(b), r.max(g).max(b))
}

pub fn rgb_to_hsl(rgb: [f64; 3]) -> [f64; 3] {
    let (min, max) = extremes(rgb);
    let (sum, delta) = (max + min, max - min);
    let l = sum / 2.0;
    let denom = 1.0 - (sum - 1.0).abs();
    let s = if denom == 0.0 { 0.0 } else { delta / denom };
    [hue(rgb[0], rgb[1], rgb[2], max, delta), s, l]
}

pub fn hsl_to_rgb([h, s, l]: [f64; 3]) -> [f64; 3] {
    let alpha = s * l.min(1.0 - l);
    [0.0, 8.0, 4.0].map(|n: f64| {
        let k = (n + h * 12.0).rem_euclid(12.0);
        l - alpha * (k - 3.0).min(9.0 - k).min(1.0).max(-1.0)
    })
}

pub fn rgb_to_hsv(rgb: [f64; 3]) -> [f64; 3] {
    let (min, max) = extremes(rgb);
    let delta = max - min;
    let s = if max == 0.0 { 0.0 } else { delta / max };
    [hue(rgb[0], rgb[1], rgb[2], max, delta), s, max]
}

pub fn hsv_to_rgb([h, s, v]: [f64; 3]) -> [f64; 3] {
    [5.0, 3.0, 1.0].map(|n: f64| {
        let k = (n + h * 6.0).rem_euclid(6.0);
        v * (1.0 - s * k.min(4.0 - k).min(1.0).max(0.0))
    })
}
