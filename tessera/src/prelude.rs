//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//! ```

// Engine
pub use crate::{Context, EngineConfig, Error, Extent, Result};

// Images and blocks
pub use crate::{BlockShape, Blocks, Frame, Images, Operand};

// Series
pub use crate::{Baseline, Series, SeriesRecord, TimeSeries};

// Filters and statistics
pub use crate::{BoundaryMode, Filter, Statistic};
