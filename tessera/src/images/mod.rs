//! Image stacks: ordered frames sharing one shape.
//!
//! Transformations on [`Images`] are deferred. Each call validates its
//! arguments against the current frame shape, appends an operation to the
//! chain and returns a new `Images` that shares the source frames. Terminal
//! calls (`collect_frames`, `values`, statistics, conversions) run the chain
//! on the context's worker pool, one frame per task.

mod ops;


use std::fmt;
use std::sync::Arc;

use ndarray::{stack, ArrayD, ArrayViewD, Axis};
use rayon::prelude::*;

use crate::blocks::{BlockShape, Blocks};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::extent::Extent;
use crate::filter::{Filter, ResolvedFilter};
use crate::local_corr;
use crate::series::{Series, TimeSeries};
use crate::stats::{self, Statistic};

pub use ops::Operand;
use ops::{Crop, FilterOp, FrameOp, MapOp, MaxProjection, Subsample, Subtract};

/// One acquisition: its index on the frame axis and its data.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub data: ArrayD<f64>,
}

impl Frame {
    pub fn new(index: usize, data: ArrayD<f64>) -> Self {
        Self { index, data }
    }
}

#[derive(Clone)]
pub struct Images {
    ctx: Context,
    source: Arc<Vec<Frame>>,
    ops: Vec<Arc<dyn FrameOp>>,
    dims: Vec<usize>,
}

impl Images {
    /// Validate and order frames: at least one non-empty frame, one shape,
    /// unique indices.
    pub(crate) fn from_frames(ctx: Context, mut frames: Vec<Frame>) -> Result<Self> {
        let Some(first) = frames.first() else {
            return Err(Error::NoFrames);
        };
        let dims = first.data.shape().to_vec();
        if dims.contains(&0) {
            return Err(Error::EmptyFrame { dims });
        }

        if let Some(bad) = frames.iter().find(|f| f.data.shape() != dims.as_slice()) {
            return Err(Error::FrameShapeMismatch {
                index: bad.index,
                expected: dims,
                actual: bad.data.shape().to_vec(),
            });
        }

        frames.sort_by_key(|f| f.index);
        if let Some(pair) = frames.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(Error::DuplicateIndex(pair[0].index));
        }

        tracing::debug!("Created image stack: {} frames of {:?}", frames.len(), dims);

        Ok(Self {
            ctx,
            source: Arc::new(frames),
            ops: Vec::new(),
            dims,
        })
    }

    fn with_op(&self, op: impl FrameOp + 'static) -> Self {
        let dims = op.output_dims(&self.dims);
        let mut ops = self.ops.clone();
        ops.push(Arc::new(op));
        Self {
            ctx: self.ctx.clone(),
            source: Arc::clone(&self.source),
            ops,
            dims,
        }
    }

    fn run_ops(&self, data: ArrayD<f64>) -> ArrayD<f64> {
        self.ops.iter().fold(data, |acc, op| op.apply(acc))
    }

    // ========================================================================
    // Shape and metadata
    // ========================================================================

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    pub fn count(&self) -> usize {
        self.source.len()
    }

    /// Per-frame shape after all pending operations.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// `[count, dims..]`, the shape of `collect_values_as_array`.
    pub fn shape(&self) -> Vec<usize> {
        std::iter::once(self.count())
            .chain(self.dims.iter().copied())
            .collect()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.source.iter().map(|f| f.index).collect()
    }

    /// Number of pending operations.
    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    // ========================================================================
    // Terminal operations
    // ========================================================================

    /// Run pending operations on every frame.
    pub fn collect_frames(&self) -> Vec<Frame> {
        tracing::debug!(
            "Materializing {} frames through {:?}",
            self.count(),
            self.ops
        );
        self.ctx.install(|| {
            self.source
                .par_iter()
                .map(|frame| Frame::new(frame.index, self.run_ops(frame.data.clone())))
                .collect()
        })
    }

    pub fn values(&self) -> Vec<ArrayD<f64>> {
        self.collect_frames().into_iter().map(|f| f.data).collect()
    }

    /// The first frame only; other frames are not computed.
    pub fn first(&self) -> ArrayD<f64> {
        self.run_ops(self.source[0].data.clone())
    }

    /// All frames stacked along a new leading axis: `[count, dims..]`.
    pub fn collect_values_as_array(&self) -> Result<ArrayD<f64>> {
        let values = self.values();
        let views: Vec<_> = values.iter().map(|v| v.view()).collect();
        Ok(stack(Axis(0), &views)?)
    }

    /// Materialize now and drop the operation chain.
    pub fn cache(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            source: Arc::new(self.collect_frames()),
            ops: Vec::new(),
            dims: self.dims.clone(),
        }
    }

    // ========================================================================
    // Geometric operations
    // ========================================================================

    /// Keep the half-open box `[min, max)` of every frame.
    pub fn crop(&self, min: &[usize], max: &[usize]) -> Result<Self> {
        Ok(self.with_op(Crop::new(&self.dims, min, max)?))
    }

    /// Keep planes `[start, end)` along the last axis.
    pub fn planes(&self, start: usize, end: usize) -> Result<Self> {
        Ok(self.with_op(Crop::planes(&self.dims, start, end)?))
    }

    /// Keep every `factor`-th element along each axis.
    pub fn subsample(&self, factor: impl Into<Extent<usize>>) -> Result<Self> {
        Ok(self.with_op(Subsample::new(&self.dims, &factor.into())?))
    }

    /// Maximum along `axis`, which is removed from the frame shape.
    pub fn max_projection(&self, axis: usize) -> Result<Self> {
        Ok(self.with_op(MaxProjection::new(&self.dims, axis)?))
    }

    /// Subtract a scalar or an array of the frame shape from every frame.
    pub fn subtract(&self, operand: impl Into<Operand>) -> Result<Self> {
        Ok(self.with_op(Subtract::new(&self.dims, operand.into())?))
    }

    /// Apply `func` to every frame, producing frames of shape `dims`.
    ///
    /// `func` only runs when the chain is materialized; it must return
    /// `dims`-shaped arrays.
    pub fn map<F>(&self, dims: &[usize], func: F) -> Result<Self>
    where
        F: Fn(ArrayViewD<f64>) -> ArrayD<f64> + Send + Sync + 'static,
    {
        if dims.contains(&0) {
            return Err(Error::EmptyFrame {
                dims: dims.to_vec(),
            });
        }
        Ok(self.with_op(MapOp::new(Arc::new(func), dims.to_vec())))
    }

    // ========================================================================
    // Filters
    // ========================================================================

    pub fn filter(&self, filter: Filter) -> Result<Self> {
        let resolved = self.resolve_filter(&filter)?;
        Ok(self.with_op(FilterOp::new(resolved)))
    }

    pub fn median_filter(&self, size: impl Into<Extent<usize>>) -> Result<Self> {
        self.filter(Filter::median(size))
    }

    pub fn gaussian_filter(&self, sigma: impl Into<Extent<f64>>) -> Result<Self> {
        self.filter(Filter::gaussian(sigma))
    }

    pub fn uniform_filter(&self, size: impl Into<Extent<usize>>) -> Result<Self> {
        self.filter(Filter::uniform(size))
    }

    fn resolve_filter(&self, filter: &Filter) -> Result<ResolvedFilter> {
        let config = self.ctx.config();
        filter.resolve(self.ndim(), config.boundary, config.gaussian_truncate)
    }

    // ========================================================================
    // Reductions across frames
    // ========================================================================

    pub fn reduce(&self, stat: Statistic) -> Result<ArrayD<f64>> {
        let values = self.values();
        let views: Vec<_> = values.iter().map(|v| v.view()).collect();
        self.ctx.install(|| stats::reduce_frames(&views, stat))
    }

    pub fn mean(&self) -> Result<ArrayD<f64>> {
        self.reduce(Statistic::Mean)
    }

    pub fn sum(&self) -> Result<ArrayD<f64>> {
        self.reduce(Statistic::Sum)
    }

    /// Population variance across frames.
    pub fn variance(&self) -> Result<ArrayD<f64>> {
        self.reduce(Statistic::Variance)
    }

    pub fn std(&self) -> Result<ArrayD<f64>> {
        self.reduce(Statistic::Std)
    }

    pub fn min(&self) -> Result<ArrayD<f64>> {
        self.reduce(Statistic::Min)
    }

    pub fn max(&self) -> Result<ArrayD<f64>> {
        self.reduce(Statistic::Max)
    }

    /// Correlation of each pixel with the mean of its neighborhood.
    ///
    /// See [`local_corr::local_corr`] for the neighborhood definition.
    pub fn local_corr(&self, radius: usize) -> ArrayD<f64> {
        let values = self.values();
        let boundary = self.ctx.config().boundary;
        self.ctx
            .install(|| local_corr::local_corr(&values, radius, boundary))
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// One record per pixel holding its values across frames.
    pub fn to_series(&self) -> Series {
        let frames = self.collect_frames();
        Series::from_frames(self.ctx.clone(), &frames, &self.dims)
    }

    pub fn to_time_series(&self) -> TimeSeries {
        TimeSeries::from(self.to_series())
    }

    /// Split every frame into blocks.
    pub fn to_blocks(&self, shape: impl Into<BlockShape>) -> Result<Blocks> {
        Blocks::from_frames(self.ctx.clone(), self.collect_frames(), &shape.into())
    }

    /// Split every frame using the context's configured block shape.
    pub fn to_blocks_default(&self) -> Result<Blocks> {
        let shape = self.ctx.config().block_shape.clone();
        self.to_blocks(shape)
    }
}

impl fmt::Debug for Images {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Images")
            .field("count", &self.count())
            .field("dims", &self.dims)
            .field("ops", &self.ops)
            .finish()
    }
}
