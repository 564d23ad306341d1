//! Shared helpers for unit tests.

use std::path::PathBuf;

use ndarray::{Array, ArrayBase, ArrayD, Data, Dimension, IxDyn};

use crate::config::EngineConfig;
use crate::context::Context;

const RTOL: f64 = 1e-9;
const ATOL: f64 = 1e-12;

/// A small two-thread context with default settings.
pub(crate) fn test_context() -> Context {
    common::log_setup::setup_test_logging();
    Context::new(EngineConfig::default().with_threads(2)).unwrap()
}

/// Scratch file path under `<workspace>/test_output`, created on demand.
pub(crate) fn test_output_path(name: &str) -> PathBuf {
    let crate_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let dir = crate_dir
        .parent()
        .unwrap_or(crate_dir.as_path())
        .join("test_output");
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

/// `0..n` as `f64`, reshaped row-major.
pub(crate) fn arange(n: usize, shape: &[usize]) -> ArrayD<f64> {
    Array::from_iter((0..n).map(|v| v as f64))
        .into_shape_with_order(IxDyn(shape))
        .unwrap()
}

/// Elementwise closeness; NaN only matches NaN.
#[track_caller]
pub(crate) fn assert_allclose<S1, S2, D>(actual: &ArrayBase<S1, D>, expected: &ArrayBase<S2, D>)
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    assert_eq!(
        actual.shape(),
        expected.shape(),
        "shape mismatch: {:?} vs {:?}",
        actual,
        expected
    );
    for (i, (&a, &e)) in actual.iter().zip(expected.iter()).enumerate() {
        let close = if e.is_nan() {
            a.is_nan()
        } else {
            (a - e).abs() <= ATOL + RTOL * e.abs()
        };
        assert!(
            close,
            "element {} differs: {} vs {}\nactual: {:?}\nexpected: {:?}",
            i, a, e, actual, expected
        );
    }
}
