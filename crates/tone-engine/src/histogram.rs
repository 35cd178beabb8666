//! Histogram visualization and percentile auto-leveling.

use crate::buffer::PixelBuffer;

/// Number of histogram bins, and the side of the rendered graph.
pub const BINS: usize = 256;

/// Density of samples in 256 equal bins over `[0, 1]`.
///
/// Density is normalized so the bins integrate to one over `[0, 1]`
/// (`count / (total * bin_width)`). The last bin includes 1.0; samples
/// outside `[0, 1]` are not counted.
pub fn density(buffer: &PixelBuffer<f64>) -> [f64; BINS] {
    let mut counts = [0u64; BINS];
    let mut total = 0u64;
    for &v in buffer.as_slice() {
        if !(0.0..=1.0).contains(&v) {
            continue;
        }
        let bin = ((v * BINS as f64) as usize).min(BINS - 1);
        counts[bin] += 1;
        total += 1;
    }
    if total == 0 {
        return [0.0; BINS];
    }
    let scale = BINS as f64 / total as f64;
    counts.map(|c| c as f64 * scale)
}

/// Render the sample histogram as a 256x256 single-channel graph.
///
/// Background is white (1.0). Column `i` is filled black (0.0) from the
/// bottom for `round(255 * density[i])` rows, capped at the graph height.
pub fn histogram(buffer: &PixelBuffer<f64>) -> PixelBuffer<f64> {
    let bins = density(buffer);
    let heights = bins.map(|d| ((255.0 * d).round_ties_even() as usize).min(BINS));
    let mut graph = vec![1.0; BINS * BINS];
    for (x, &height) in heights.iter().enumerate() {
        for y in BINS - height..BINS {
            graph[y * BINS + x] = 0.0;
        }
    }
    PixelBuffer::gray_from_vec(BINS, BINS, graph)
}

/// Stretch contrast so the middle of the tonal range spans `[0, 1]`.
///
/// Pixels are ranked by a luminance proxy (the channel sum for color
/// buffers, the sample itself for gray ones). The `k = round(pixels *
/// ignore_fraction)` darkest and brightest are ignored; the min and max of
/// all samples of the remaining pixels define the linear rescale, and the
/// result is clamped to `[0, 1]`. Returns the input unchanged if nothing
/// remains or if that min equals the max.
pub fn auto_correct(buffer: &PixelBuffer<f64>, ignore_fraction: f64) -> PixelBuffer<f64> {
    let n = buffer.pixel_count();
    let k = (n as f64 * ignore_fraction).round_ties_even().max(0.0) as usize;
    if n == 0 || 2 * k >= n {
        return buffer.clone();
    }

    let proxies: Vec<f64> = buffer.pixels().map(|px| px.iter().sum()).collect();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| proxies[a].total_cmp(&proxies[b]));

    let channels = buffer.channels();
    let samples = buffer.as_slice();
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &i in &order[k..n - k] {
        for &v in &samples[i * channels..(i + 1) * channels] {
            min = min.min(v);
            max = max.max(v);
        }
    }

    if min == max {
        return buffer.clone();
    }
    tracing::debug!(min, max, ignored = k, "auto level");
    let range = max - min;
    buffer.map(|v| ((v - min) / range).clamp(0.0, 1.0))
}
