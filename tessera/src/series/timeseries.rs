//! Series whose index is a time axis.

use std::f64::consts::PI;
use std::ops::Deref;

use ndarray::{arr1, Array1, ArrayView1};

use super::Series;
use crate::error::{Error, Result};
use crate::stats;

#[derive(Debug, Clone)]
pub struct TimeSeries {
    series: Series,
}

impl From<Series> for TimeSeries {
    fn from(series: Series) -> Self {
        Self { series }
    }
}

impl Deref for TimeSeries {
    type Target = Series;

    fn deref(&self) -> &Self::Target {
        &self.series
    }
}

impl TimeSeries {
    pub fn into_series(self) -> Series {
        self.series
    }

    /// Remove the least-squares linear trend from every record.
    pub fn detrend(&self) -> Self {
        Self::from(self.series.transform(detrend_linear))
    }

    /// Coherence and phase of every record at frequency bin `freq`.
    ///
    /// Each output record holds `[coherence, phase]`, phase in `[0, 2pi)`.
    pub fn fourier(&self, freq: usize) -> Result<Series> {
        let half = self.index().len() / 2;
        if freq >= half {
            return Err(Error::InvalidParameter {
                what: "fourier frequency",
                reason: format!(
                    "bin {} is not below half the series length ({})",
                    freq, half
                ),
            });
        }
        self.series.map_values(|values| coherence_phase(values, freq))
    }
}

fn detrend_linear(values: ArrayView1<f64>) -> Array1<f64> {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = stats::mean(values);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }
    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };

    Array1::from_iter(
        values
            .iter()
            .enumerate()
            .map(|(i, &y)| y - (mean_y + slope * (i as f64 - mean_x))),
    )
}

/// Single-bin spectral summary of a mean-removed sequence.
///
/// Amplitudes are `2|X_k| / n` over bins `0..n/2`; coherence is the
/// amplitude at `freq` over the root sum of squared amplitudes.
fn coherence_phase(values: ArrayView1<f64>, freq: usize) -> Array1<f64> {
    let n = values.len();
    let mean = stats::mean(values);

    let spectrum: Vec<(f64, f64)> = (0..n / 2)
        .map(|k| {
            values.iter().enumerate().fold((0.0, 0.0), |(re, im), (j, &y)| {
                let angle = 2.0 * PI * (k * j) as f64 / n as f64;
                let v = y - mean;
                (re + v * angle.cos(), im - v * angle.sin())
            })
        })
        .collect();

    let amplitudes: Vec<f64> = spectrum
        .iter()
        .map(|(re, im)| 2.0 * re.hypot(*im) / n as f64)
        .collect();
    let total = amplitudes.iter().map(|a| a * a).sum::<f64>().sqrt();
    let coherence = amplitudes[freq] / total;

    let (re, im) = spectrum[freq];
    let mut phase = -(PI / 2.0) - im.atan2(re);
    if phase < 0.0 {
        phase += 2.0 * PI;
    }

    arr1(&[coherence, phase])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detrend_removes_line() {
        let values = arr1(&[1.0, 3.0, 5.0, 7.0]);
        let out = detrend_linear(values.view());
        assert!(out.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_detrend_keeps_residual() {
        // Two steps: the fitted line undershoots the first pair and overshoots the second.
        let values = arr1(&[1.0, 1.0, 5.0, 5.0]);
        let out = detrend_linear(values.view());
        let residual_sum: f64 = out.sum();
        assert!(residual_sum.abs() < 1e-12);
        assert!(out[0] > 0.0 && out[1] < 0.0);
    }

    #[test]
    fn test_coherence_of_pure_tone() {
        let n = 16;
        let freq = 2;
        let values = Array1::from_iter(
            (0..n).map(|j| (2.0 * PI * (freq * j) as f64 / n as f64).cos()),
        );
        let out = coherence_phase(values.view(), freq);
        assert!((out[0] - 1.0).abs() < 1e-9);
        // cos has zero spectral angle, so the phase is 3pi/2.
        assert!((out[1] - 1.5 * PI).abs() < 1e-9);
    }
}
