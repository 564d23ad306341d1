//! Reductions across the frame axis and per-sequence statistics.


use ndarray::{stack, ArrayD, ArrayView1, ArrayViewD, Axis, Zip};
use strum_macros::Display;

use crate::error::Result;

/// A reduction of a value sequence to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Statistic {
    Mean,
    Sum,
    /// Population variance (divides by N).
    Variance,
    /// Square root of the population variance.
    Std,
    Min,
    Max,
}

impl Statistic {
    pub fn reduce(self, values: ArrayView1<f64>) -> f64 {
        match self {
            Statistic::Mean => mean(values),
            Statistic::Sum => values.sum(),
            Statistic::Variance => variance(values),
            Statistic::Std => variance(values).sqrt(),
            Statistic::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Statistic::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Reduce a stack of equally shaped frames pixel by pixel.
///
/// Returns an array with the per-frame shape.
pub(crate) fn reduce_frames(frames: &[ArrayViewD<f64>], stat: Statistic) -> Result<ArrayD<f64>> {
    let stacked = stack(Axis(0), frames)?;
    let mut output = ArrayD::zeros(stacked.index_axis(Axis(0), 0).raw_dim());

    Zip::from(&mut output)
        .and(stacked.lanes(Axis(0)))
        .par_for_each(|out, lane| *out = stat.reduce(lane));

    tracing::debug!("Reduced {} frames with {}", frames.len(), stat);
    Ok(output)
}

#[inline]
pub fn mean(values: ArrayView1<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sum() / values.len() as f64
}

/// Population variance, two-pass.
#[inline]
pub fn variance(values: ArrayView1<f64>) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Pearson correlation coefficient. NaN when either sequence is constant.
pub fn pearson(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    debug_assert_eq!(a.len(), b.len());

    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Percentile with linear interpolation between closest ranks, `p` in `0..=100`.
pub fn percentile(values: ArrayView1<f64>, p: f64) -> f64 {
    debug_assert!((0.0..=100.0).contains(&p));
    if values.is_empty() {
        return f64::NAN;
    }

    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
