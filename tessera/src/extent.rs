//! Per-axis parameters given once for every axis or explicitly per axis.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A value broadcast to all spatial axes, or one value per axis.
///
/// `Extent::Uniform(2)` and `Extent::PerAxis(vec![2, 2])` resolve to the same
/// thing for 2-dimensional frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Extent<T> {
    Uniform(T),
    PerAxis(Vec<T>),
}

impl<T: Copy> Extent<T> {
    /// Expand to exactly `ndim` values.
    pub fn resolve(&self, ndim: usize) -> Result<Vec<T>> {
        match self {
            Extent::Uniform(value) => Ok(vec![*value; ndim]),
            Extent::PerAxis(values) if values.len() == ndim => Ok(values.clone()),
            Extent::PerAxis(values) => Err(Error::RankMismatch {
                ndim,
                actual: values.len(),
            }),
        }
    }
}

impl From<usize> for Extent<usize> {
    fn from(value: usize) -> Self {
        Extent::Uniform(value)
    }
}

impl From<f64> for Extent<f64> {
    fn from(value: f64) -> Self {
        Extent::Uniform(value)
    }
}

impl<T> From<Vec<T>> for Extent<T> {
    fn from(values: Vec<T>) -> Self {
        Extent::PerAxis(values)
    }
}

impl<T: Clone> From<&[T]> for Extent<T> {
    fn from(values: &[T]) -> Self {
        Extent::PerAxis(values.to_vec())
    }
}

impl<T, const N: usize> From<[T; N]> for Extent<T> {
    fn from(values: [T; N]) -> Self {
        Extent::PerAxis(values.into())
    }
}
