//! Engine configuration.
//!
//! A single flat [`EngineConfig`] carries the worker pool size, the default
//! block plan and the filter boundary handling. It can be loaded from YAML or
//! JSON; the format follows the file extension.

use std::path::Path;

use common::FileFormat;
use serde::{Deserialize, Serialize};

use crate::blocks::BlockShape;
use crate::error::{Error, Result};
use crate::filter::BoundaryMode;

/// Default gaussian kernel truncation, in standard deviations.
pub const DEFAULT_GAUSSIAN_TRUNCATE: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ========================================================================
    // Execution
    // ========================================================================
    /// Worker threads for partition-parallel work. `None` uses every core.
    pub threads: Option<usize>,

    // ========================================================================
    // Partitioning
    // ========================================================================
    /// Block plan used by `Images::to_blocks_default`.
    pub block_shape: BlockShape,

    // ========================================================================
    // Filtering
    // ========================================================================
    /// How filters sample outside the frame.
    pub boundary: BoundaryMode,
    /// Gaussian kernels extend to `truncate * sigma` on each side.
    pub gaussian_truncate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threads: None,
            block_shape: BlockShape::default(),
            boundary: BoundaryMode::default(),
            gaussian_truncate: DEFAULT_GAUSSIAN_TRUNCATE,
        }
    }
}

impl EngineConfig {
    /// Load a config from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = FileFormat::from_file_name(&path.to_string_lossy())?;
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = common::deserialize(&text, format)?;
        config.validate()?;

        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_block_shape(mut self, block_shape: BlockShape) -> Self {
        self.block_shape = block_shape;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryMode) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.threads == Some(0) {
            return Err(Error::InvalidParameter {
                what: "threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.gaussian_truncate.is_finite() && self.gaussian_truncate > 0.0) {
            return Err(Error::InvalidParameter {
                what: "gaussian_truncate",
                reason: format!("must be positive, got {}", self.gaussian_truncate),
            });
        }
        self.block_shape.validate()
    }
}
