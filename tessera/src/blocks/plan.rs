//! Block shapes and the regular grid they induce on a frame.

use ndarray::{ArrayD, Slice};
use serde::{Deserialize, Serialize};

use crate::coords::{element_count, unravel_first_fastest};
use crate::error::{Error, Result};
use crate::extent::Extent;

/// Default block budget for memory-sized plans: 150 MiB.
pub const DEFAULT_BLOCK_BYTES: usize = 150 * 1024 * 1024;

/// How to size blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockShape {
    /// Block size per axis; sizes above the axis length are clamped.
    Size(Extent<usize>),
    /// Number of blocks per axis; counts above the axis length are clamped.
    Count(Extent<usize>),
    /// Largest axis halved until one block holds at most this many bytes.
    Bytes(usize),
}

impl Default for BlockShape {
    fn default() -> Self {
        BlockShape::Bytes(DEFAULT_BLOCK_BYTES)
    }
}

impl BlockShape {
    pub fn validate(&self) -> Result<()> {
        let has_zero = match self {
            BlockShape::Size(Extent::Uniform(v)) | BlockShape::Count(Extent::Uniform(v)) => {
                *v == 0
            }
            BlockShape::Size(Extent::PerAxis(v)) | BlockShape::Count(Extent::PerAxis(v)) => {
                v.contains(&0)
            }
            BlockShape::Bytes(bytes) => *bytes == 0,
        };
        if has_zero {
            return Err(Error::InvalidParameter {
                what: "block shape",
                reason: format!("{:?} must be positive", self),
            });
        }
        Ok(())
    }
}

impl From<usize> for BlockShape {
    fn from(size: usize) -> Self {
        BlockShape::Size(Extent::Uniform(size))
    }
}

impl From<Vec<usize>> for BlockShape {
    fn from(sizes: Vec<usize>) -> Self {
        BlockShape::Size(Extent::PerAxis(sizes))
    }
}

impl<const N: usize> From<[usize; N]> for BlockShape {
    fn from(sizes: [usize; N]) -> Self {
        BlockShape::Size(Extent::PerAxis(sizes.into()))
    }
}

/// A resolved block grid for one frame shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    dims: Vec<usize>,
    block: Vec<usize>,
}

impl BlockPlan {
    pub fn new(dims: &[usize], shape: &BlockShape) -> Result<Self> {
        shape.validate()?;
        if dims.contains(&0) {
            return Err(Error::EmptyFrame {
                dims: dims.to_vec(),
            });
        }

        let block = match shape {
            BlockShape::Size(size) => size
                .resolve(dims.len())?
                .iter()
                .zip(dims)
                .map(|(&s, &d)| s.min(d))
                .collect(),
            BlockShape::Count(count) => count
                .resolve(dims.len())?
                .iter()
                .zip(dims)
                .map(|(&c, &d)| d.div_ceil(c.min(d)))
                .collect(),
            BlockShape::Bytes(bytes) => block_for_bytes(dims, *bytes),
        };

        Ok(Self {
            dims: dims.to_vec(),
            block,
        })
    }

    /// Frame shape the plan was built for.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Shape of a full (non-edge) block.
    pub fn block_dims(&self) -> &[usize] {
        &self.block
    }

    /// Number of blocks along each axis.
    pub fn grid(&self) -> Vec<usize> {
        self.dims
            .iter()
            .zip(&self.block)
            .map(|(d, b)| d.div_ceil(*b))
            .collect()
    }

    /// Blocks per frame.
    pub fn count(&self) -> usize {
        element_count(&self.grid())
    }

    /// Origins of all blocks, first axis varying fastest.
    pub fn origins(&self) -> Vec<Vec<usize>> {
        let grid = self.grid();
        (0..element_count(&grid))
            .map(|k| {
                unravel_first_fastest(k, &grid)
                    .iter()
                    .zip(&self.block)
                    .map(|(g, b)| g * b)
                    .collect()
            })
            .collect()
    }

    /// Length of the block starting at `origin` along `axis`.
    pub fn extent_at(&self, origin: &[usize], axis: usize) -> usize {
        self.block[axis].min(self.dims[axis] - origin[axis])
    }

    /// Copy the block starting at `origin` out of `frame`.
    pub(crate) fn cut(&self, frame: &ArrayD<f64>, origin: &[usize]) -> ArrayD<f64> {
        frame
            .slice_each_axis(|ax| {
                let axis = ax.axis.index();
                let start = origin[axis];
                Slice::from(start..start + self.extent_at(origin, axis))
            })
            .to_owned()
    }
}

/// Halve the largest axis until a block of `f64` fits in `bytes`.
fn block_for_bytes(dims: &[usize], bytes: usize) -> Vec<usize> {
    let item = std::mem::size_of::<f64>();
    let mut block = dims.to_vec();

    while element_count(&block) * item > bytes {
        let Some((axis, _)) = block
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b > 1)
            .max_by_key(|&(axis, &b)| (b, std::cmp::Reverse(axis)))
        else {
            break;
        };
        block[axis] = block[axis].div_ceil(2);
    }

    block
}
