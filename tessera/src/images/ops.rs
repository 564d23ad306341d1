//! Deferred per-frame operations.
//!
//! Each operation is validated against the input frame shape when it is
//! constructed and reports its output shape, so applying it never fails.

use std::fmt;
use std::sync::Arc;

use ndarray::{ArrayD, ArrayViewD, Axis, Slice};

use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::filter::ResolvedFilter;

pub(crate) trait FrameOp: Send + Sync {
    fn name(&self) -> String;

    fn output_dims(&self, input: &[usize]) -> Vec<usize>;

    fn apply(&self, frame: ArrayD<f64>) -> ArrayD<f64>;
}

impl fmt::Debug for dyn FrameOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Half-open box selection `[min, max)` per axis.
pub(crate) struct Crop {
    name: &'static str,
    min: Vec<usize>,
    max: Vec<usize>,
}

impl Crop {
    pub(crate) fn new(dims: &[usize], min: &[usize], max: &[usize]) -> Result<Self> {
        let valid = min.len() == dims.len()
            && max.len() == dims.len()
            && min
                .iter()
                .zip(max)
                .zip(dims)
                .all(|((&lo, &hi), &d)| lo < hi && hi <= d);
        if !valid {
            return Err(Error::InvalidCrop {
                min: min.to_vec(),
                max: max.to_vec(),
                dims: dims.to_vec(),
            });
        }

        Ok(Self {
            name: "crop",
            min: min.to_vec(),
            max: max.to_vec(),
        })
    }

    /// Selects `[start, end)` along the last axis.
    pub(crate) fn planes(dims: &[usize], start: usize, end: usize) -> Result<Self> {
        let Some(&len) = dims.last() else {
            return Err(Error::InvalidPlanes { start, end, len: 0 });
        };
        if start >= end || end > len {
            return Err(Error::InvalidPlanes { start, end, len });
        }

        let mut min = vec![0; dims.len()];
        let mut max = dims.to_vec();
        let last = dims.len() - 1;
        min[last] = start;
        max[last] = end;

        Ok(Self {
            name: "planes",
            min,
            max,
        })
    }
}

impl FrameOp for Crop {
    fn name(&self) -> String {
        format!("{}({:?}..{:?})", self.name, self.min, self.max)
    }

    fn output_dims(&self, _input: &[usize]) -> Vec<usize> {
        self.min.iter().zip(&self.max).map(|(lo, hi)| hi - lo).collect()
    }

    fn apply(&self, frame: ArrayD<f64>) -> ArrayD<f64> {
        frame
            .slice_each_axis(|ax| {
                let axis = ax.axis.index();
                Slice::from(self.min[axis]..self.max[axis])
            })
            .to_owned()
    }
}

/// Keeps every `factor`-th element per axis, starting at zero.
pub(crate) struct Subsample {
    factors: Vec<usize>,
}

impl Subsample {
    pub(crate) fn new(dims: &[usize], factor: &Extent<usize>) -> Result<Self> {
        let factors = factor.resolve(dims.len())?;
        if factors.contains(&0) {
            return Err(Error::InvalidParameter {
                what: "subsample factor",
                reason: format!("must be at least 1 along every axis, got {:?}", factors),
            });
        }
        Ok(Self { factors })
    }
}

impl FrameOp for Subsample {
    fn name(&self) -> String {
        format!("subsample({:?})", self.factors)
    }

    fn output_dims(&self, input: &[usize]) -> Vec<usize> {
        input
            .iter()
            .zip(&self.factors)
            .map(|(d, f)| d.div_ceil(*f))
            .collect()
    }

    fn apply(&self, frame: ArrayD<f64>) -> ArrayD<f64> {
        frame
            .slice_each_axis(|ax| Slice::new(0, None, self.factors[ax.axis.index()] as isize))
            .to_owned()
    }
}

/// Maximum along one axis; the axis is removed.
pub(crate) struct MaxProjection {
    axis: usize,
}

impl MaxProjection {
    pub(crate) fn new(dims: &[usize], axis: usize) -> Result<Self> {
        if axis >= dims.len() || dims.len() < 2 {
            return Err(Error::InvalidAxis {
                axis,
                ndim: dims.len(),
            });
        }
        Ok(Self { axis })
    }
}

impl FrameOp for MaxProjection {
    fn name(&self) -> String {
        format!("max_projection({})", self.axis)
    }

    fn output_dims(&self, input: &[usize]) -> Vec<usize> {
        let mut dims = input.to_vec();
        dims.remove(self.axis);
        dims
    }

    fn apply(&self, frame: ArrayD<f64>) -> ArrayD<f64> {
        frame.fold_axis(Axis(self.axis), f64::NEG_INFINITY, |&acc, &v| acc.max(v))
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

/// Right-hand side of an elementwise frame operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(f64),
    Array(ArrayD<f64>),
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl<D: ndarray::Dimension> From<ndarray::Array<f64, D>> for Operand {
    fn from(array: ndarray::Array<f64, D>) -> Self {
        Operand::Array(array.into_dyn())
    }
}

pub(crate) struct Subtract {
    operand: Operand,
}

impl Subtract {
    pub(crate) fn new(dims: &[usize], operand: Operand) -> Result<Self> {
        if let Operand::Array(array) = &operand {
            if array.shape() != dims {
                return Err(Error::OperandShapeMismatch {
                    expected: dims.to_vec(),
                    actual: array.shape().to_vec(),
                });
            }
        }
        Ok(Self { operand })
    }
}

impl FrameOp for Subtract {
    fn name(&self) -> String {
        match &self.operand {
            Operand::Scalar(v) => format!("subtract({})", v),
            Operand::Array(a) => format!("subtract(array{:?})", a.shape()),
        }
    }

    fn output_dims(&self, input: &[usize]) -> Vec<usize> {
        input.to_vec()
    }

    fn apply(&self, frame: ArrayD<f64>) -> ArrayD<f64> {
        match &self.operand {
            Operand::Scalar(v) => frame - *v,
            Operand::Array(a) => frame - a,
        }
    }
}

// ============================================================================
// Filters and user maps
// ============================================================================

pub(crate) struct FilterOp {
    filter: ResolvedFilter,
}

impl FilterOp {
    pub(crate) fn new(filter: ResolvedFilter) -> Self {
        Self { filter }
    }
}

impl FrameOp for FilterOp {
    fn name(&self) -> String {
        format!("{}_filter", self.filter.kind())
    }

    fn output_dims(&self, input: &[usize]) -> Vec<usize> {
        input.to_vec()
    }

    fn apply(&self, frame: ArrayD<f64>) -> ArrayD<f64> {
        self.filter.apply(frame.view())
    }
}

pub(crate) type MapFn = Arc<dyn Fn(ArrayViewD<f64>) -> ArrayD<f64> + Send + Sync>;

/// Arbitrary per-frame function with a caller-declared output shape.
pub(crate) struct MapOp {
    func: MapFn,
    dims: Vec<usize>,
}

impl MapOp {
    pub(crate) fn new(func: MapFn, dims: Vec<usize>) -> Self {
        Self { func, dims }
    }
}

impl FrameOp for MapOp {
    fn name(&self) -> String {
        format!("map(-> {:?})", self.dims)
    }

    fn output_dims(&self, _input: &[usize]) -> Vec<usize> {
        self.dims.clone()
    }

    fn apply(&self, frame: ArrayD<f64>) -> ArrayD<f64> {
        let output = (self.func)(frame.view());
        debug_assert_eq!(
            output.shape(),
            self.dims.as_slice(),
            "map must produce the same shape for every frame"
        );
        output
    }
}
