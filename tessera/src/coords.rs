//! Coordinate ordering helpers.
//!
//! Series records are ordered with the first spatial axis varying fastest,
//! while array storage is row-major (last axis fastest).

use std::cmp::Ordering;

/// Number of elements in a frame of the given shape.
#[inline]
pub(crate) fn element_count(dims: &[usize]) -> usize {
    dims.iter().product()
}

/// Coordinate of the `k`-th element when the first axis varies fastest.
pub(crate) fn unravel_first_fastest(mut k: usize, dims: &[usize]) -> Vec<usize> {
    let mut coord = Vec::with_capacity(dims.len());
    for &d in dims {
        coord.push(k % d);
        k /= d;
    }
    coord
}

/// Row-major strides for a contiguous frame.
pub(crate) fn row_major_strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; dims.len()];
    for axis in (0..dims.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * dims[axis + 1];
    }
    strides
}

/// Row-major flat offset of `coord`.
#[inline]
pub(crate) fn ravel_row_major(coord: &[usize], strides: &[usize]) -> usize {
    coord.iter().zip(strides).map(|(c, s)| c * s).sum()
}

/// Canonical series key ordering: compares from the last axis to the first.
pub(crate) fn cmp_first_fastest(a: &[usize], b: &[usize]) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}
