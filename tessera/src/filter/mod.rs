//! N-dimensional local filters: median, gaussian and uniform (box).
//!
//! Window conventions follow the classic n-d image filters: a window of size
//! `s` covers offsets `-(s / 2) ..= s - s / 2 - 1` around each sample, and
//! samples outside the frame come from the configured [`BoundaryMode`].
//! Gaussian and uniform filters are separable and run one axis at a time;
//! the median filter gathers the full n-d window.

#[cfg(test)]
mod tests;

use ndarray::{ArrayD, ArrayView1, ArrayViewD, ArrayViewMut1, Axis, Dimension, Zip};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::coords::{ravel_row_major, row_major_strides};
use crate::error::{Error, Result};
use crate::extent::Extent;

/// How samples outside the frame are produced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "lowercase")]
pub enum BoundaryMode {
    /// Half-sample symmetric: `d c b a | a b c d | d c b a`.
    #[default]
    Reflect,
    /// Repeat the edge sample: `a a a a | a b c d | d d d d`.
    Nearest,
    /// Whole-sample symmetric: `d c b | a b c d | c b a`.
    Mirror,
    /// Periodic: `a b c d | a b c d | a b c d`.
    Wrap,
    /// Fill with a constant: `k k k k | a b c d | k k k k`.
    Constant(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum FilterKind {
    Median,
    Gaussian,
    Uniform,
}

/// A local filter with its window size (sigma for gaussian).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Median { size: Extent<usize> },
    Gaussian { sigma: Extent<f64> },
    Uniform { size: Extent<usize> },
}

impl Filter {
    pub fn median(size: impl Into<Extent<usize>>) -> Self {
        Filter::Median { size: size.into() }
    }

    pub fn gaussian(sigma: impl Into<Extent<f64>>) -> Self {
        Filter::Gaussian {
            sigma: sigma.into(),
        }
    }

    pub fn uniform(size: impl Into<Extent<usize>>) -> Self {
        Filter::Uniform { size: size.into() }
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Median { .. } => FilterKind::Median,
            Filter::Gaussian { .. } => FilterKind::Gaussian,
            Filter::Uniform { .. } => FilterKind::Uniform,
        }
    }

    /// Broadcast sizes to `ndim` axes and check them.
    pub(crate) fn resolve(
        &self,
        ndim: usize,
        mode: BoundaryMode,
        truncate: f64,
    ) -> Result<ResolvedFilter> {
        let window = match self {
            Filter::Median { size } => Window::Median(positive_sizes("median size", size, ndim)?),
            Filter::Uniform { size } => {
                Window::Uniform(positive_sizes("uniform size", size, ndim)?)
            }
            Filter::Gaussian { sigma } => {
                let sigma = sigma.resolve(ndim)?;
                if let Some(bad) = sigma.iter().find(|s| !(s.is_finite() && **s >= 0.0)) {
                    return Err(Error::InvalidParameter {
                        what: "gaussian sigma",
                        reason: format!("must be finite and non-negative, got {}", bad),
                    });
                }
                Window::Gaussian { sigma, truncate }
            }
        };
        Ok(ResolvedFilter { window, mode })
    }
}

fn positive_sizes(what: &'static str, size: &Extent<usize>, ndim: usize) -> Result<Vec<usize>> {
    let sizes = size.resolve(ndim)?;
    if sizes.contains(&0) {
        return Err(Error::InvalidParameter {
            what,
            reason: format!("must be at least 1 along every axis, got {:?}", sizes),
        });
    }
    Ok(sizes)
}

#[derive(Debug, Clone, PartialEq)]
enum Window {
    Median(Vec<usize>),
    Gaussian { sigma: Vec<f64>, truncate: f64 },
    Uniform(Vec<usize>),
}

/// A filter checked against a frame rank, ready to apply.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedFilter {
    window: Window,
    mode: BoundaryMode,
}

impl ResolvedFilter {
    pub(crate) fn kind(&self) -> FilterKind {
        match self.window {
            Window::Median(_) => FilterKind::Median,
            Window::Gaussian { .. } => FilterKind::Gaussian,
            Window::Uniform(_) => FilterKind::Uniform,
        }
    }

    pub(crate) fn apply(&self, frame: ArrayViewD<f64>) -> ArrayD<f64> {
        match &self.window {
            Window::Median(sizes) => median_filter(frame, sizes, self.mode),
            Window::Uniform(sizes) => uniform_filter(frame, sizes, self.mode),
            Window::Gaussian { sigma, truncate } => {
                gaussian_filter(frame, sigma, *truncate, self.mode)
            }
        }
    }
}

// ============================================================================
// Boundary handling
// ============================================================================

/// Map a possibly out-of-range position onto `0..len`.
///
/// Returns `None` when the sample should take the constant fill value.
#[inline]
pub(crate) fn boundary_index(pos: isize, len: usize, mode: BoundaryMode) -> Option<usize> {
    debug_assert!(len > 0);
    if (0..len as isize).contains(&pos) {
        return Some(pos as usize);
    }

    let n = len as isize;
    match mode {
        BoundaryMode::Constant(_) => None,
        BoundaryMode::Nearest => Some(pos.clamp(0, n - 1) as usize),
        BoundaryMode::Wrap => Some(pos.rem_euclid(n) as usize),
        BoundaryMode::Reflect => {
            let m = pos.rem_euclid(2 * n);
            Some(if m < n { m } else { 2 * n - 1 - m } as usize)
        }
        BoundaryMode::Mirror => {
            if n == 1 {
                return Some(0);
            }
            let period = 2 * n - 2;
            let m = pos.rem_euclid(period);
            Some(if m < n { m } else { period - m } as usize)
        }
    }
}

#[inline]
fn fill_value(mode: BoundaryMode) -> f64 {
    match mode {
        BoundaryMode::Constant(value) => value,
        _ => 0.0,
    }
}

// ============================================================================
// Separable filters
// ============================================================================

/// Normalized 1D gaussian weights covering `-radius..=radius`.
///
/// The radius is `floor(truncate * sigma + 0.5)`.
pub fn gaussian_kernel_1d(sigma: f64, truncate: f64) -> Vec<f64> {
    assert!(sigma > 0.0, "Sigma must be positive");

    let radius = (truncate * sigma + 0.5) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-x * x / two_sigma_sq).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }

    kernel
}

pub(crate) fn gaussian_filter(
    frame: ArrayViewD<f64>,
    sigma: &[f64],
    truncate: f64,
    mode: BoundaryMode,
) -> ArrayD<f64> {
    let mut output = frame.to_owned();
    for (axis, &s) in sigma.iter().enumerate() {
        if s == 0.0 {
            continue;
        }
        let kernel = gaussian_kernel_1d(s, truncate);
        let left = kernel.len() / 2;
        output = correlate_axis(output.view(), axis, &kernel, left, mode);
    }
    output
}

pub(crate) fn uniform_filter(
    frame: ArrayViewD<f64>,
    sizes: &[usize],
    mode: BoundaryMode,
) -> ArrayD<f64> {
    let mut output = frame.to_owned();
    for (axis, &size) in sizes.iter().enumerate() {
        if size == 1 {
            continue;
        }
        let weights = vec![1.0 / size as f64; size];
        output = correlate_axis(output.view(), axis, &weights, size / 2, mode);
    }
    output
}

/// Correlate every lane along `axis` with `weights`.
///
/// Output sample `j` is `sum_k weights[k] * input[j + k - left]`.
fn correlate_axis(
    input: ArrayViewD<f64>,
    axis: usize,
    weights: &[f64],
    left: usize,
    mode: BoundaryMode,
) -> ArrayD<f64> {
    let mut output = ArrayD::zeros(input.raw_dim());
    Zip::from(output.lanes_mut(Axis(axis)))
        .and(input.lanes(Axis(axis)))
        .par_for_each(|out, lane| correlate_lane(lane, out, weights, left, mode));
    output
}

fn correlate_lane(
    input: ArrayView1<f64>,
    mut output: ArrayViewMut1<f64>,
    weights: &[f64],
    left: usize,
    mode: BoundaryMode,
) {
    let len = input.len();
    let fill = fill_value(mode);

    for (j, out) in output.iter_mut().enumerate() {
        let start = j as isize - left as isize;
        *out = weights
            .iter()
            .enumerate()
            .map(|(k, &w)| {
                let sample = match boundary_index(start + k as isize, len, mode) {
                    Some(i) => input[i],
                    None => fill,
                };
                w * sample
            })
            .sum();
    }
}

// ============================================================================
// Median filter
// ============================================================================

pub(crate) fn median_filter(
    frame: ArrayViewD<f64>,
    sizes: &[usize],
    mode: BoundaryMode,
) -> ArrayD<f64> {
    if sizes.iter().all(|&s| s == 1) {
        return frame.to_owned();
    }

    let dims = frame.shape().to_vec();
    let strides = row_major_strides(&dims);
    let values: Vec<f64> = frame.iter().copied().collect();
    let offsets = window_offsets(sizes);
    let fill = fill_value(mode);

    let mut output = ArrayD::zeros(frame.raw_dim());
    output.indexed_iter_mut().par_bridge().for_each(|(idx, out)| {
        let center = idx.slice();
        let mut window = Vec::with_capacity(offsets.len());
        let mut coord = vec![0usize; dims.len()];

        'offsets: for offset in &offsets {
            for (axis, (&c, &o)) in center.iter().zip(offset).enumerate() {
                match boundary_index(c as isize + o, dims[axis], mode) {
                    Some(i) => coord[axis] = i,
                    None => {
                        window.push(fill);
                        continue 'offsets;
                    }
                }
            }
            window.push(values[ravel_row_major(&coord, &strides)]);
        }

        let rank = window.len() / 2;
        *out = select_rank(&mut window, rank);
    });

    output
}

/// All window offsets for the given per-axis sizes.
fn window_offsets(sizes: &[usize]) -> Vec<Vec<isize>> {
    let mut offsets: Vec<Vec<isize>> = vec![Vec::new()];
    for &size in sizes {
        let left = (size / 2) as isize;
        offsets = offsets
            .into_iter()
            .flat_map(|prefix| {
                (0..size as isize).map(move |k| {
                    let mut next = prefix.clone();
                    next.push(k - left);
                    next
                })
            })
            .collect();
    }
    offsets
}

/// Value of the given rank in sorted order (partial sort).
#[inline]
fn select_rank(values: &mut [f64], rank: usize) -> f64 {
    let (_, value, _) = values.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
    *value
}
