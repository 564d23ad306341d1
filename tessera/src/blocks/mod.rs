//! Block partitioning of image stacks.
//!
//! Every frame is cut into contiguous, non-overlapping blocks on a regular
//! grid. Blocks start at multiples of the block shape; when the shape does
//! not divide an axis, the last block along that axis is smaller. Each block
//! is keyed by its frame index and spatial origin.

mod plan;


use std::collections::BTreeMap;
use std::fmt;

use ndarray::{ArrayD, IxDyn, Slice};
use rayon::prelude::*;

use crate::context::Context;
use crate::coords::{cmp_first_fastest, element_count, unravel_first_fastest};
use crate::error::{Error, Result};
use crate::images::{Frame, Images};
use crate::series::{Series, SeriesRecord};

pub use plan::{BlockPlan, BlockShape, DEFAULT_BLOCK_BYTES};

/// A spatial sub-region of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub frame_index: usize,
    pub origin: Vec<usize>,
    pub data: ArrayD<f64>,
}

#[derive(Clone)]
pub struct Blocks {
    ctx: Context,
    plan: BlockPlan,
    index: Vec<usize>,
    blocks: Vec<Block>,
}

impl Blocks {
    pub(crate) fn from_frames(
        ctx: Context,
        frames: Vec<Frame>,
        shape: &BlockShape,
    ) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Err(Error::NoFrames);
        };
        let plan = BlockPlan::new(first.data.shape(), shape)?;
        let origins = plan.origins();

        let blocks = ctx.install(|| {
            let plan = &plan;
            frames
                .par_iter()
                .flat_map_iter(|frame| {
                    origins.iter().map(move |origin| Block {
                        frame_index: frame.index,
                        origin: origin.clone(),
                        data: plan.cut(&frame.data, origin),
                    })
                })
                .collect()
        });

        tracing::debug!(
            "Partitioned {} frames of {:?} into {} blocks of {:?}",
            frames.len(),
            plan.dims(),
            origins.len(),
            plan.block_dims()
        );

        Ok(Self {
            ctx,
            plan,
            index: frames.iter().map(|f| f.index).collect(),
            blocks,
        })
    }

    pub fn plan(&self) -> &BlockPlan {
        &self.plan
    }

    /// Frame indices covered, ascending.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    pub fn count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// `(frame index, origin)` of every block.
    pub fn keys(&self) -> Vec<(usize, Vec<usize>)> {
        self.blocks
            .iter()
            .map(|b| (b.frame_index, b.origin.clone()))
            .collect()
    }

    /// Blocks grouped by origin, each group ordered by frame index.
    fn groups(&self) -> Result<Vec<(&[usize], Vec<&Block>)>> {
        let mut groups: BTreeMap<&[usize], Vec<&Block>> = BTreeMap::new();
        for block in &self.blocks {
            groups.entry(block.origin.as_slice()).or_default().push(block);
        }

        groups
            .into_iter()
            .map(|(origin, mut group)| {
                group.sort_by_key(|b| b.frame_index);
                let complete = group.len() == self.index.len()
                    && group.iter().zip(&self.index).all(|(b, &i)| b.frame_index == i);
                if !complete {
                    return Err(Error::IncompleteBlocks {
                        origin: origin.to_vec(),
                        expected: self.index.len(),
                        actual: group.len(),
                    });
                }
                Ok((origin, group))
            })
            .collect()
    }

    /// Regroup block pixels into per-coordinate series.
    ///
    /// Produces the same records, in the same order, as converting the
    /// frames directly.
    pub fn to_series(&self) -> Result<Series> {
        let groups = self.groups()?;

        let mut records: Vec<SeriesRecord> = self.ctx.install(|| {
            groups
                .par_iter()
                .flat_map_iter(|(origin, group)| {
                    let extent = group[0].data.shape().to_vec();
                    (0..element_count(&extent)).map(move |k| {
                        let local = unravel_first_fastest(k, &extent);
                        let key = local
                            .iter()
                            .zip(origin.iter())
                            .map(|(l, o)| l + o)
                            .collect();
                        let values = group.iter().map(|b| b.data[local.as_slice()]).collect();
                        SeriesRecord::new(key, values)
                    })
                })
                .collect()
        });
        records.par_sort_by(|a, b| cmp_first_fastest(&a.key, &b.key));

        tracing::debug!(
            "Converted {} blocks to {} series records",
            self.blocks.len(),
            records.len()
        );
        Ok(Series::from_sorted(
            self.ctx.clone(),
            self.index.clone(),
            self.plan.dims().to_vec(),
            records,
        ))
    }

    /// Reassemble the original frames.
    pub fn to_images(&self) -> Result<Images> {
        self.groups()?;

        let mut by_frame: BTreeMap<usize, Vec<&Block>> = BTreeMap::new();
        for block in &self.blocks {
            by_frame.entry(block.frame_index).or_default().push(block);
        }

        let dims = self.plan.dims();
        let frames: Vec<Frame> = self.ctx.install(|| {
            by_frame
                .into_par_iter()
                .map(|(index, blocks)| {
                    let mut data = ArrayD::zeros(IxDyn(dims));
                    for block in blocks {
                        data.slice_each_axis_mut(|ax| {
                            let axis = ax.axis.index();
                            let start = block.origin[axis];
                            Slice::from(start..start + block.data.shape()[axis])
                        })
                        .assign(&block.data);
                    }
                    Frame::new(index, data)
                })
                .collect()
        });

        Images::from_frames(self.ctx.clone(), frames)
    }
}

impl fmt::Debug for Blocks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blocks")
            .field("plan", &self.plan)
            .field("frames", &self.index.len())
            .field("blocks", &self.blocks.len())
            .finish()
    }
}
