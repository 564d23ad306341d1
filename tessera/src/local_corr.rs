//! Local correlation: how strongly each pixel follows its neighborhood.

use ndarray::{Array1, ArrayD, Dimension};
use rayon::prelude::*;

use crate::filter::{uniform_filter, BoundaryMode};
use crate::stats::pearson;

/// Window sizes of the neighborhood mean for frames of rank `ndim`.
///
/// The neighborhood spans `2 * radius + 1` samples along the first two axes
/// and a single sample along any further axis, so volumes are correlated
/// plane by plane.
pub fn neighborhood_sizes(ndim: usize, radius: usize) -> Vec<usize> {
    let size = 2 * radius + 1;
    (0..ndim).map(|axis| if axis < 2 { size } else { 1 }).collect()
}

/// Pearson correlation between every pixel's frame sequence and the
/// sequence of its neighborhood mean (center pixel included).
///
/// Returns an array of the frame shape. Pixels whose sequence, or whose
/// neighborhood mean, is constant across frames are NaN.
pub fn local_corr(frames: &[ArrayD<f64>], radius: usize, mode: BoundaryMode) -> ArrayD<f64> {
    let Some(first) = frames.first() else {
        return ArrayD::zeros(ndarray::IxDyn(&[]));
    };
    let sizes = neighborhood_sizes(first.ndim(), radius);

    let blurred: Vec<ArrayD<f64>> = frames
        .par_iter()
        .map(|frame| uniform_filter(frame.view(), &sizes, mode))
        .collect();

    let mut output = ArrayD::zeros(first.raw_dim());
    output.indexed_iter_mut().par_bridge().for_each(|(idx, out)| {
        let coord = idx.slice();
        let own: Array1<f64> = frames.iter().map(|f| f[coord]).collect();
        let neighborhood: Array1<f64> = blurred.iter().map(|f| f[coord]).collect();
        *out = pearson(own.view(), neighborhood.view());
    });

    tracing::debug!(
        "Local correlation over {} frames with window {:?}",
        frames.len(),
        sizes
    );
    output
}
