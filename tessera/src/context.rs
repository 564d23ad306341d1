//! Execution context: the worker pool every materialization runs on.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ndarray::{Array, Dimension};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::images::{Frame, Images};

/// Shared handle to the engine configuration and its worker pool.
///
/// Cheap to clone; every `Images`, `Blocks` and `Series` derived from a
/// context keeps a handle to it and runs its parallel work on its pool.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    config: EngineConfig,
    pool: rayon::ThreadPool,
}

impl Context {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("tessera-worker-{}", i));
        if let Some(threads) = config.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        tracing::info!(
            "Created context with {} worker threads, boundary mode {}",
            pool.current_num_threads(),
            config.boundary
        );

        Ok(Self {
            inner: Arc::new(ContextInner { config, pool }),
        })
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(EngineConfig::load(path)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    pub fn num_threads(&self) -> usize {
        self.inner.pool.current_num_threads()
    }

    /// Run `op` inside the worker pool so nested rayon calls use it.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.inner.pool.install(op)
    }

    /// Build an image stack from in-memory frames, indexed `0..n`.
    pub fn from_list<I, D>(&self, arrays: I) -> Result<Images>
    where
        I: IntoIterator<Item = Array<f64, D>>,
        D: Dimension,
    {
        let frames = arrays
            .into_iter()
            .enumerate()
            .map(|(index, data)| Frame::new(index, data.into_dyn()))
            .collect();
        Images::from_frames(self.clone(), frames)
    }

    /// Build an image stack from explicitly indexed frames.
    ///
    /// Frames are ordered by index; indices must be unique.
    pub fn from_indexed<I, D>(&self, pairs: I) -> Result<Images>
    where
        I: IntoIterator<Item = (usize, Array<f64, D>)>,
        D: Dimension,
    {
        let frames = pairs
            .into_iter()
            .map(|(index, data)| Frame::new(index, data.into_dyn()))
            .collect();
        Images::from_frames(self.clone(), frames)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.inner.config)
            .field("threads", &self.num_threads())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr2, Array2};

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_thread_count_from_config() {
        let ctx = Context::new(EngineConfig::default().with_threads(2)).unwrap();
        assert_eq!(ctx.num_threads(), 2);
        assert_eq!(ctx.install(rayon::current_num_threads), 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = Context::new(EngineConfig::default().with_threads(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_from_list_assigns_sequential_indices() {
        let ctx = Context::new(EngineConfig::default()).unwrap();
        let images = ctx
            .from_list(vec![Array2::<f64>::zeros((2, 2)), Array2::ones((2, 2))])
            .unwrap();
        assert_eq!(images.indices(), vec![0, 1]);
        assert_eq!(images.dims(), &[2, 2]);
    }

    #[test]
    fn test_from_indexed_sorts_frames() {
        let ctx = Context::new(EngineConfig::default()).unwrap();
        let images = ctx
            .from_indexed(vec![
                (7, arr2(&[[7.0]])),
                (2, arr2(&[[2.0]])),
                (5, arr2(&[[5.0]])),
            ])
            .unwrap();
        assert_eq!(images.indices(), vec![2, 5, 7]);
        assert_eq!(images.first()[[0, 0]], 2.0);
    }

    #[test]
    fn test_from_indexed_rejects_duplicates() {
        let ctx = Context::new(EngineConfig::default()).unwrap();
        let err = ctx
            .from_indexed(vec![(1, arr2(&[[1.0]])), (1, arr2(&[[2.0]]))])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateIndex(1)));
    }
}
