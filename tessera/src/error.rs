//! Error types for image, block and series operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or converting image stacks and series.
///
/// Operations validate their arguments against the known frame shape when
/// they are added to a pipeline, so materialization itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No frames provided")]
    NoFrames,

    #[error("Frame {index} has shape {actual:?}, expected {expected:?}")]
    FrameShapeMismatch {
        index: usize,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Frame shape {dims:?} has no elements")]
    EmptyFrame { dims: Vec<usize> },

    #[error("Duplicate frame index {0}")]
    DuplicateIndex(usize),

    #[error("Operand shape {actual:?} does not match frame shape {expected:?}")]
    OperandShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Expected {ndim} per-axis values, got {actual}")]
    RankMismatch { ndim: usize, actual: usize },

    #[error("Crop bounds {min:?}..{max:?} are invalid for frame shape {dims:?}")]
    InvalidCrop {
        min: Vec<usize>,
        max: Vec<usize>,
        dims: Vec<usize>,
    },

    #[error("Planes {start}..{end} are out of range for last axis of length {len}")]
    InvalidPlanes { start: usize, end: usize, len: usize },

    #[error("Axis {axis} is out of range for {ndim}-dimensional frames")]
    InvalidAxis { axis: usize, ndim: usize },

    #[error("Invalid {what}: {reason}")]
    InvalidParameter { what: &'static str, reason: String },

    #[error("Series has {actual} records, {expected} are needed to fill frame shape {dims:?}")]
    IncompleteSeries {
        expected: usize,
        actual: usize,
        dims: Vec<usize>,
    },

    #[error("Series record {key:?} is invalid: {reason}")]
    InvalidRecord { key: Vec<usize>, reason: String },

    #[error("Block at {origin:?} has {actual} frames, expected {expected}")]
    IncompleteBlocks {
        origin: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to read config '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported config file: {0}")]
    ConfigFormat(#[from] common::FileExtensionError),

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] common::SerdeFormatError),
}

pub type Result<T> = std::result::Result<T, Error>;
