//! Pixel-major layout: one value sequence per spatial coordinate.
//!
//! Records are kept in canonical order, first spatial axis varying fastest,
//! regardless of how they were produced. Direct conversion from frames and
//! conversion through blocks therefore yield identical series.

mod timeseries;


use std::fmt;

use ndarray::{Array1, Array2, ArrayD, ArrayView1, IxDyn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::coords::{
    cmp_first_fastest, element_count, ravel_row_major, row_major_strides, unravel_first_fastest,
};
use crate::error::{Error, Result};
use crate::images::{Frame, Images};
use crate::stats::{self, Statistic};

pub use timeseries::TimeSeries;

/// Values of one spatial coordinate across the frame index.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRecord {
    pub key: Vec<usize>,
    pub values: Array1<f64>,
}

impl SeriesRecord {
    pub fn new(key: Vec<usize>, values: Array1<f64>) -> Self {
        Self { key, values }
    }
}

/// Baseline used by [`Series::normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Baseline {
    Mean,
    /// Percentile in `0..=100`.
    Percentile(f64),
}

#[derive(Clone)]
pub struct Series {
    ctx: Context,
    index: Vec<usize>,
    dims: Vec<usize>,
    records: Vec<SeriesRecord>,
}

impl Series {
    /// Build a series from records in any order.
    ///
    /// Every key must lie inside `dims` and appear once, and every record
    /// must hold one value per index entry.
    pub fn new(
        ctx: Context,
        index: Vec<usize>,
        dims: Vec<usize>,
        mut records: Vec<SeriesRecord>,
    ) -> Result<Self> {
        if index.is_empty() {
            return Err(Error::NoFrames);
        }
        for record in &records {
            let in_bounds = record.key.len() == dims.len()
                && record.key.iter().zip(&dims).all(|(k, d)| k < d);
            if !in_bounds {
                return Err(Error::InvalidRecord {
                    key: record.key.clone(),
                    reason: format!("outside frame shape {:?}", dims),
                });
            }
            if record.values.len() != index.len() {
                return Err(Error::InvalidRecord {
                    key: record.key.clone(),
                    reason: format!(
                        "has {} values, index has {}",
                        record.values.len(),
                        index.len()
                    ),
                });
            }
        }

        records.par_sort_by(|a, b| cmp_first_fastest(&a.key, &b.key));
        if let Some(pair) = records.windows(2).find(|w| w[0].key == w[1].key) {
            return Err(Error::InvalidRecord {
                key: pair[0].key.clone(),
                reason: "duplicate key".to_string(),
            });
        }

        Ok(Self::from_sorted(ctx, index, dims, records))
    }

    /// Records must already be validated and in canonical order.
    pub(crate) fn from_sorted(
        ctx: Context,
        index: Vec<usize>,
        dims: Vec<usize>,
        records: Vec<SeriesRecord>,
    ) -> Self {
        Self {
            ctx,
            index,
            dims,
            records,
        }
    }

    /// Gather every pixel of equally shaped frames into records.
    pub(crate) fn from_frames(ctx: Context, frames: &[Frame], dims: &[usize]) -> Self {
        let index: Vec<usize> = frames.iter().map(|f| f.index).collect();
        let strides = row_major_strides(dims);
        let count = element_count(dims);

        let records = ctx.install(|| {
            let flat: Vec<Vec<f64>> = frames
                .par_iter()
                .map(|f| f.data.iter().copied().collect())
                .collect();

            (0..count)
                .into_par_iter()
                .map(|k| {
                    let key = unravel_first_fastest(k, dims);
                    let offset = ravel_row_major(&key, &strides);
                    let values = flat.iter().map(|values| values[offset]).collect();
                    SeriesRecord::new(key, values)
                })
                .collect()
        });

        tracing::debug!(
            "Converted {} frames of {:?} to {} series records",
            frames.len(),
            dims,
            count
        );
        Self::from_sorted(ctx, index, dims.to_vec(), records)
    }

    fn with_records(&self, index: Vec<usize>, records: Vec<SeriesRecord>) -> Self {
        Self::from_sorted(self.ctx.clone(), index, self.dims.clone(), records)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Frame indices the values correspond to.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Spatial shape the keys address.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[SeriesRecord] {
        &self.records
    }

    pub fn keys(&self) -> Vec<Vec<usize>> {
        self.records.iter().map(|r| r.key.clone()).collect()
    }

    pub fn first(&self) -> Option<&SeriesRecord> {
        self.records.first()
    }

    /// Values as `[records, index]`, records in canonical order.
    pub fn collect_values_as_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.records.len(), self.index.len()), |(r, t)| {
            self.records[r].values[t]
        })
    }

    // ========================================================================
    // Reassembly
    // ========================================================================

    /// One array of shape `dims` per index entry.
    pub fn pack(&self) -> Result<Vec<ArrayD<f64>>> {
        let expected = element_count(&self.dims);
        if self.records.len() != expected {
            return Err(Error::IncompleteSeries {
                expected,
                actual: self.records.len(),
                dims: self.dims.clone(),
            });
        }

        let arrays = self.ctx.install(|| {
            (0..self.index.len())
                .into_par_iter()
                .map(|t| {
                    let mut array = ArrayD::zeros(IxDyn(&self.dims));
                    for record in &self.records {
                        array[record.key.as_slice()] = record.values[t];
                    }
                    array
                })
                .collect()
        });
        Ok(arrays)
    }

    /// Pack back into an image stack with the same frame indices.
    pub fn to_images(&self) -> Result<Images> {
        let arrays = self.pack()?;
        self.ctx.from_indexed(self.index.iter().copied().zip(arrays))
    }

    // ========================================================================
    // Value transforms
    // ========================================================================

    /// Apply `func` to every record's values.
    ///
    /// When the output length differs from the index, the index becomes
    /// `0..len`. All outputs must have the same length.
    pub fn map_values<F>(&self, func: F) -> Result<Self>
    where
        F: Fn(ArrayView1<f64>) -> Array1<f64> + Send + Sync,
    {
        let records: Vec<SeriesRecord> = self.ctx.install(|| {
            self.records
                .par_iter()
                .map(|r| SeriesRecord::new(r.key.clone(), func(r.values.view())))
                .collect()
        });

        let Some(len) = records.first().map(|r| r.values.len()) else {
            return Ok(self.with_records(self.index.clone(), records));
        };
        if len == 0 {
            return Err(Error::InvalidParameter {
                what: "map_values output",
                reason: "function produced no values".to_string(),
            });
        }
        if let Some(bad) = records.iter().find(|r| r.values.len() != len) {
            return Err(Error::InvalidRecord {
                key: bad.key.clone(),
                reason: format!("has {} values, expected {}", bad.values.len(), len),
            });
        }

        let index = if len == self.index.len() {
            self.index.clone()
        } else {
            (0..len).collect()
        };
        Ok(self.with_records(index, records))
    }

    /// Keep the index entries at the given positions, in the given order.
    pub fn select(&self, positions: &[usize]) -> Result<Self> {
        if positions.is_empty() {
            return Err(Error::InvalidParameter {
                what: "selection",
                reason: "no positions given".to_string(),
            });
        }
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.index.len()) {
            return Err(Error::InvalidParameter {
                what: "selection",
                reason: format!(
                    "position {} outside index of length {}",
                    bad,
                    self.index.len()
                ),
            });
        }

        let index = positions.iter().map(|&p| self.index[p]).collect();
        let records = self.ctx.install(|| {
            self.records
                .par_iter()
                .map(|r| {
                    let values = positions.iter().map(|&p| r.values[p]).collect();
                    SeriesRecord::new(r.key.clone(), values)
                })
                .collect()
        });
        Ok(self.with_records(index, records))
    }

    /// Keep index entries whose value lies in `left..=right`.
    pub fn between(&self, left: usize, right: usize) -> Result<Self> {
        let positions: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, i)| (left..=right).contains(*i))
            .map(|(p, _)| p)
            .collect();
        if positions.is_empty() {
            return Err(Error::InvalidParameter {
                what: "selection",
                reason: format!("no index entries between {} and {}", left, right),
            });
        }
        self.select(&positions)
    }

    /// Subtract each record's mean.
    pub fn center(&self) -> Self {
        self.transform(|values| {
            let m = stats::mean(values);
            values.mapv(|v| v - m)
        })
    }

    /// Subtract each record's mean and divide by its standard deviation.
    ///
    /// Constant records become all zeros.
    pub fn zscore(&self) -> Self {
        self.transform(|values| {
            let m = stats::mean(values);
            let s = stats::variance(values).sqrt();
            if s == 0.0 {
                Array1::zeros(values.len())
            } else {
                values.mapv(|v| (v - m) / s)
            }
        })
    }

    /// `(y - b) / (b + perturbation)` with a per-record baseline `b`.
    pub fn normalize(&self, baseline: Baseline, perturbation: f64) -> Result<Self> {
        if let Baseline::Percentile(p) = baseline {
            if !(0.0..=100.0).contains(&p) {
                return Err(Error::InvalidParameter {
                    what: "baseline percentile",
                    reason: format!("must be within 0..=100, got {}", p),
                });
            }
        }

        Ok(self.transform(|values| {
            let b = match baseline {
                Baseline::Mean => stats::mean(values),
                Baseline::Percentile(p) => stats::percentile(values, p),
            };
            values.mapv(|v| (v - b) / (b + perturbation))
        }))
    }

    /// Reduce every record to one value; the index becomes `[0]`.
    ///
    /// Packing the result gives a map of the statistic over the frame shape.
    pub fn stat(&self, stat: Statistic) -> Self {
        let records = self.ctx.install(|| {
            self.records
                .par_iter()
                .map(|r| {
                    let value = stat.reduce(r.values.view());
                    SeriesRecord::new(r.key.clone(), Array1::from_elem(1, value))
                })
                .collect()
        });
        self.with_records(vec![0], records)
    }

    /// Length-preserving per-record transform.
    fn transform<F>(&self, func: F) -> Self
    where
        F: Fn(ArrayView1<f64>) -> Array1<f64> + Send + Sync,
    {
        let records = self.ctx.install(|| {
            self.records
                .par_iter()
                .map(|r| SeriesRecord::new(r.key.clone(), func(r.values.view())))
                .collect()
        });
        self.with_records(self.index.clone(), records)
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("records", &self.records.len())
            .field("index", &self.index)
            .field("dims", &self.dims)
            .finish()
    }
}
