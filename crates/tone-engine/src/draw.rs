//! Anti-aliased shape coverage.
//!
//! Shapes are filled into a binary mask at 4x resolution in both axes and
//! then reduced by averaging each 4x4 block, giving per-pixel coverage in
//! `[0, 1]` in steps of 1/16.
//!
//! Coordinates are continuous pixel units: pixel `(x, y)` spans
//! `[x, x + 1) x [y, y + 1)`. Sub-sample `s` along an axis sits at
//! `(s + 0.5) / 4`.

use crate::buffer::{BufferError, PixelBuffer};

/// Supersampling factor per axis.
pub const SUPERSAMPLE: usize = 4;

/// A point in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn to_supersampled(self) -> Self {
        let s = SUPERSAMPLE as f64;
        Self::new(self.x * s - 0.5, self.y * s - 0.5)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// One side of the scanline sweep: walks polygon edges from the top vertex
/// in one direction.
struct EdgeWalker<'a> {
    points: &'a [Point],
    from: usize,
    to: usize,
    forward: bool,
    steps: usize,
}

impl<'a> EdgeWalker<'a> {
    fn new(points: &'a [Point], top: usize, forward: bool) -> Self {
        let mut walker = Self {
            points,
            from: top,
            to: top,
            forward,
            steps: 0,
        };
        walker.to = walker.next(top);
        walker
    }

    fn next(&self, i: usize) -> usize {
        let n = self.points.len();
        if self.forward {
            (i + 1) % n
        } else {
            (i + n - 1) % n
        }
    }

    /// Move on while the edge's far endpoint lies above scanline `y`.
    fn advance_to(&mut self, y: f64) {
        while self.points[self.to].y < y && self.steps < self.points.len() {
            self.from = self.to;
            self.to = self.next(self.to);
            self.steps += 1;
        }
    }

    /// Horizontal extent of the current edge at scanline `y`.
    fn span_at(&self, y: f64) -> (f64, f64) {
        let (a, b) = (self.points[self.from], self.points[self.to]);
        if a.y == b.y {
            return (a.x.min(b.x), a.x.max(b.x));
        }
        let t = ((y - a.y) / (b.y - a.y)).clamp(0.0, 1.0);
        let x = a.x + (b.x - a.x) * t;
        (x, x)
    }
}

/// Fill a convex polygon into a supersampled mask of `big_w x big_h`.
fn fill_convex(mask: &mut [bool], big_w: usize, big_h: usize, points: &[Point]) {
    let Some((top, _)) = points
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.y.total_cmp(&b.y))
    else {
        return;
    };
    let y_max = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let mut left = EdgeWalker::new(points, top, false);
    let mut right = EdgeWalker::new(points, top, true);

    let first = points[top].y.ceil().max(0.0) as usize;
    let last = y_max.floor();
    if last < 0.0 {
        return;
    }
    let last = (last as usize).min(big_h.saturating_sub(1));

    for row in first..=last {
        if row >= big_h {
            break;
        }
        let y = row as f64;
        left.advance_to(y);
        right.advance_to(y);
        let (l_lo, l_hi) = left.span_at(y);
        let (r_lo, r_hi) = right.span_at(y);
        let lo = l_lo.min(r_lo).ceil().max(0.0);
        let hi = l_hi.max(r_hi).floor();
        if hi < lo || lo >= big_w as f64 {
            continue;
        }
        let (lo, hi) = (lo as usize, (hi as usize).min(big_w - 1));
        let start = row * big_w;
        for sample in &mut mask[start + lo..=start + hi] {
            *sample = true;
        }
    }
}

/// Average each `SUPERSAMPLE x SUPERSAMPLE` block of the mask.
fn downsample(mask: &[bool], width: usize, height: usize) -> PixelBuffer<f64> {
    let big_w = width * SUPERSAMPLE;
    let block = (SUPERSAMPLE * SUPERSAMPLE) as f64;
    let mut coverage = vec![0.0; width * height];
    for (by, row) in mask.chunks_exact(big_w.max(1)).enumerate() {
        let y = by / SUPERSAMPLE;
        for (bx, _) in row.iter().enumerate().filter(|&(_, &set)| set) {
            coverage[y * width + bx / SUPERSAMPLE] += 1.0;
        }
    }
    for c in &mut coverage {
        *c /= block;
    }
    PixelBuffer::gray_from_vec(width, height, coverage)
}

/// Coverage map of a convex polygon.
///
/// Vertices may be given in either winding order. Parts outside the image
/// are cut off; fewer than three vertices give an empty map.
pub fn draw_polygon(width: usize, height: usize, points: &[Point]) -> PixelBuffer<f64> {
    let (big_w, big_h) = (width * SUPERSAMPLE, height * SUPERSAMPLE);
    let mut mask = vec![false; big_w * big_h];
    if points.len() >= 3 && points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        let scaled: Vec<Point> = points.iter().map(|p| p.to_supersampled()).collect();
        fill_convex(&mut mask, big_w, big_h, &scaled);
    }
    downsample(&mask, width, height)
}

/// Coverage map of a straight stroke from `p1` to `p2`.
///
/// The segment is extruded by `line_width / 2` on each side into a
/// rectangle whose corners are clipped to the image extent. A zero-length
/// segment draws nothing.
///
/// `line_width` is the full stroke width: a value of 2 paints a band two
/// pixels tall, not two pixels on either side of the segment.
pub fn draw_line(width: usize, height: usize, p1: Point, p2: Point, line_width: f64) -> PixelBuffer<f64> {
    let (hx, hy) = (p2.x - p1.x, p2.y - p1.y);
    let length = hx.hypot(hy);
    if length == 0.0 || !length.is_finite() {
        return draw_polygon(width, height, &[]);
    }
    let half = line_width / 2.0;
    let (ox, oy) = (half * hy / length, -half * hx / length);
    let clip = |x: f64, y: f64| Point::new(x.clamp(0.0, width as f64), y.clamp(0.0, height as f64));
    let corners = [
        clip(p1.x + ox, p1.y + oy),
        clip(p2.x + ox, p2.y + oy),
        clip(p2.x - ox, p2.y - oy),
        clip(p1.x - ox, p1.y - oy),
    ];
    draw_polygon(width, height, &corners)
}

/// Blend `color` over `image` using `coverage` as alpha.
///
/// Gray images are expanded to three channels first.
pub fn overlay(
    image: &PixelBuffer<f64>,
    coverage: &PixelBuffer<f64>,
    color: [f64; 3],
) -> Result<PixelBuffer<f64>, BufferError> {
    if (image.width(), image.height()) != (coverage.width(), coverage.height()) {
        return Err(BufferError::SizeMismatch(
            image.width(),
            image.height(),
            coverage.width(),
            coverage.height(),
        ));
    }
    let mut out = image.expand_gray();
    for (px, &alpha) in out
        .as_mut_slice()
        .chunks_exact_mut(3)
        .zip(coverage.as_slice())
    {
        for (sample, &paint) in px.iter_mut().zip(&color) {
            *sample = *sample * (1.0 - alpha) + paint * alpha;
        }
    }
    Ok(out)
}
