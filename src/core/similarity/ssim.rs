//! Mean structural similarity (SSIM).
//!
//! Per channel, SSIM is evaluated on every `window × window` block that
//! lies fully inside the image, using uniform weights and sample
//! (N-1) covariance, then averaged. The image score is the mean over
//! channels.
//!
//! Window sums are kept in running column totals, so memory stays at
//! one row of accumulators regardless of image height.

use super::{SimilarityMetric, SimilarityScore};
use crate::core::raster::Raster;
use crate::error::DimensionError;

/// Range used when the reference raster is perfectly flat
const FLAT_DATA_RANGE: f64 = 255.0;

/// SSIM parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ssim {
    /// Side of the square window; shrunk to fit small images, forced odd
    pub window: u32,
    /// Luminance stabilizer constant
    pub k1: f64,
    /// Contrast stabilizer constant
    pub k2: f64,
}

impl Default for Ssim {
    fn default() -> Self {
        Self {
            window: 7,
            k1: 0.01,
            k2: 0.03,
        }
    }
}

impl Ssim {
    fn effective_window(&self, width: u32, height: u32) -> usize {
        let mut window = self.window.max(1).min(width).min(height);
        if window % 2 == 0 {
            window -= 1;
        }
        window as usize
    }
}

impl SimilarityMetric for Ssim {
    fn score(&self, reference: &Raster, other: &Raster) -> Result<SimilarityScore, DimensionError> {
        if reference.channels() != other.channels() {
            return Err(DimensionError::ChannelMismatch {
                reference: reference.channels(),
                other: other.channels(),
            });
        }
        if !reference.same_dimensions(other) {
            return Err(DimensionError::BufferLength {
                expected: reference.byte_size(),
                actual: other.byte_size(),
            });
        }

        let (lo, hi) = reference.value_range();
        let data_range = match hi - lo {
            0 => FLAT_DATA_RANGE,
            span => span as f64,
        };
        let c1 = (self.k1 * data_range).powi(2);
        let c2 = (self.k2 * data_range).powi(2);

        let window = self.effective_window(reference.width(), reference.height());
        let channels = reference.channels() as usize;

        let total: f64 = (0..channels)
            .map(|channel| mean_channel_ssim(reference, other, channel, window, c1, c2))
            .sum();

        Ok(total / channels as f64)
    }

    fn name(&self) -> &'static str {
        "SSIM"
    }
}

/// Running sums for one column of the current window band:
/// x, y, x², y², xy
type Moments = [f64; 5];

fn mean_channel_ssim(
    reference: &Raster,
    other: &Raster,
    channel: usize,
    window: usize,
    c1: f64,
    c2: f64,
) -> f64 {
    let width = reference.width() as usize;
    let height = reference.height() as usize;
    let stride = reference.channels() as usize;
    let (xs, ys) = (reference.pixels(), other.pixels());

    let samples = (window * window) as f64;
    let cov_norm = if window > 1 {
        samples / (samples - 1.0)
    } else {
        1.0
    };

    let mut columns: Vec<Moments> = vec![[0.0; 5]; width];
    let mut total = 0.0;
    let mut windows = 0usize;

    for row in 0..height {
        accumulate_row(&mut columns, xs, ys, row, width, stride, channel, 1.0);
        if row >= window {
            accumulate_row(&mut columns, xs, ys, row - window, width, stride, channel, -1.0);
        }
        if row + 1 < window {
            continue;
        }

        let mut sums: Moments = [0.0; 5];
        for x in 0..width {
            for (sum, value) in sums.iter_mut().zip(columns[x]) {
                *sum += value;
            }
            if x >= window {
                for (sum, value) in sums.iter_mut().zip(columns[x - window]) {
                    *sum -= value;
                }
            }
            if x + 1 < window {
                continue;
            }

            total += window_ssim(sums, samples, cov_norm, c1, c2);
            windows += 1;
        }
    }

    // window <= width and window <= height, so at least one window exists
    total / windows as f64
}

#[allow(clippy::too_many_arguments)]
fn accumulate_row(
    columns: &mut [Moments],
    xs: &[u8],
    ys: &[u8],
    row: usize,
    width: usize,
    stride: usize,
    channel: usize,
    sign: f64,
) {
    let start = row * width * stride + channel;
    for (x, column) in columns.iter_mut().enumerate() {
        let index = start + x * stride;
        let a = xs[index] as f64;
        let b = ys[index] as f64;
        column[0] += sign * a;
        column[1] += sign * b;
        column[2] += sign * a * a;
        column[3] += sign * b * b;
        column[4] += sign * a * b;
    }
}

fn window_ssim(sums: Moments, samples: f64, cov_norm: f64, c1: f64, c2: f64) -> f64 {
    let [sx, sy, sxx, syy, sxy] = sums;
    let ux = sx / samples;
    let uy = sy / samples;
    let vx = cov_norm * (sxx / samples - ux * ux);
    let vy = cov_norm * (syy / samples - uy * uy);
    let vxy = cov_norm * (sxy / samples - ux * uy);

    let numerator = (2.0 * ux * uy + c1) * (2.0 * vxy + c2);
    let denominator = (ux * ux + uy * uy + c1) * (vx + vy + c2);

    if denominator == 0.0 {
        1.0
    } else {
        numerator / denominator
    }
}
