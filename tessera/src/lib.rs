//! Tessera - image stacks, blocks and pixel series.
//!
//! This library provides tools for analysing stacks of images acquired over
//! time, including:
//! - Lazy per-frame transformations (crop, subsample, filters, arithmetic)
//! - Block partitioning of frames
//! - Conversion between frame-major images and pixel-major series
//! - Per-pixel statistics and local correlation across frames
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! let ctx = Context::new(EngineConfig::default())?;
//! let images = ctx.from_list(frames)?;
//!
//! let smoothed = images.gaussian_filter(2.0)?.subsample(2usize)?;
//! let series = smoothed.to_series();
//! let mean = smoothed.mean()?;
//! ```

pub mod blocks;
mod config;
mod context;
pub(crate) mod coords;
mod error;
mod extent;
pub mod filter;
pub mod images;
pub mod local_corr;
pub mod series;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub mod prelude;

// ============================================================================
// Engine
// ============================================================================

pub use config::{EngineConfig, DEFAULT_GAUSSIAN_TRUNCATE};
pub use context::Context;
pub use error::{Error, Result};
pub use extent::Extent;

// ============================================================================
// Images and blocks
// ============================================================================

pub use blocks::{Block, BlockPlan, BlockShape, Blocks, DEFAULT_BLOCK_BYTES};
pub use images::{Frame, Images, Operand};

// ============================================================================
// Series
// ============================================================================

pub use series::{Baseline, Series, SeriesRecord, TimeSeries};

// ============================================================================
// Filters and statistics
// ============================================================================

pub use filter::{BoundaryMode, Filter, FilterKind};
pub use stats::Statistic;
