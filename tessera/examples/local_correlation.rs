//! Example: Local Correlation of a Synthetic Recording
//!
//! This example runs the full pipeline on random data:
//! 1. Build a stack of noisy frames sharing a slow common signal
//! 2. Smooth, crop and subtract the baseline lazily
//! 3. Compute per-pixel statistics and the local correlation map
//! 4. Convert to series through blocks and summarise each record
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example local_correlation -- [config.yaml]
//! ```

use std::env;

use anyhow::Result;
use ndarray::{Array, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tessera::prelude::*;

const FRAMES: usize = 40;
const ROWS: usize = 64;
const COLS: usize = 48;

fn main() -> Result<()> {
    common::log_setup::setup_logging("local_correlation", "info");

    let config = match env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let ctx = Context::new(config)?;
    tracing::info!("Running with {} threads", ctx.num_threads());

    let images = ctx.from_list(synthetic_frames(42))?;
    tracing::info!(
        "Loaded {} frames of {:?}",
        images.count(),
        images.dims()
    );

    let baseline = images.mean()?;
    let prepared = images
        .gaussian_filter(1.0)?
        .subtract(baseline)?
        .crop(&[4, 4], &[ROWS - 4, COLS - 4])?
        .cache();

    let variance = prepared.variance()?;
    let corr = prepared.local_corr(2);
    let finite: Vec<f64> = corr.iter().copied().filter(|v| v.is_finite()).collect();
    let mean_corr = finite.iter().sum::<f64>() / finite.len().max(1) as f64;
    tracing::info!(
        "Local correlation: mean {:.3} over {} pixels, peak variance {:.3}",
        mean_corr,
        finite.len(),
        variance.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    );

    let series = prepared.to_blocks_default()?.to_series()?;
    let peaks = series.stat(Statistic::Max).pack()?;
    tracing::info!(
        "Converted to {} series records; max map shape {:?}",
        series.count(),
        peaks[0].shape()
    );

    let normalized = series.normalize(Baseline::Percentile(20.0), 0.1)?;
    if let Some(record) = normalized.first() {
        tracing::info!(
            "First record {:?}: {} values",
            record.key,
            record.values.len()
        );
    }

    Ok(())
}

/// Noise plus a shared sinusoid whose strength fades from left to right.
fn synthetic_frames(seed: u64) -> Vec<Array2<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..FRAMES)
        .map(|t| {
            let signal = (t as f64 * 0.3).sin();
            Array::from_shape_fn((ROWS, COLS), |(_, c)| {
                let weight = 1.0 - c as f64 / COLS as f64;
                weight * signal + 0.3 * rng.random_range(-1.0..1.0)
            })
        })
        .collect()
}
