//! Tests for n-d local filters.

use ndarray::{arr1, arr2, ArrayD, IxDyn};

use super::*;
use crate::testing::{arange, assert_allclose};

#[test]
fn test_boundary_index_modes() {
    // len 4: a b c d
    let len = 4;
    let reflect: Vec<_> = (-3..7)
        .map(|p| boundary_index(p, len, BoundaryMode::Reflect).unwrap())
        .collect();
    assert_eq!(reflect, vec![2, 1, 0, 0, 1, 2, 3, 3, 2, 1]);

    let mirror: Vec<_> = (-3..7)
        .map(|p| boundary_index(p, len, BoundaryMode::Mirror).unwrap())
        .collect();
    assert_eq!(mirror, vec![3, 2, 1, 0, 1, 2, 3, 2, 1, 0]);

    let nearest: Vec<_> = (-2..6)
        .map(|p| boundary_index(p, len, BoundaryMode::Nearest).unwrap())
        .collect();
    assert_eq!(nearest, vec![0, 0, 0, 1, 2, 3, 3, 3]);

    let wrap: Vec<_> = (-2..6)
        .map(|p| boundary_index(p, len, BoundaryMode::Wrap).unwrap())
        .collect();
    assert_eq!(wrap, vec![2, 3, 0, 1, 2, 3, 0, 1]);

    assert_eq!(boundary_index(-1, len, BoundaryMode::Constant(0.0)), None);
    assert_eq!(boundary_index(2, len, BoundaryMode::Constant(0.0)), Some(2));
}

#[test]
fn test_boundary_index_single_sample() {
    for mode in [
        BoundaryMode::Reflect,
        BoundaryMode::Mirror,
        BoundaryMode::Nearest,
        BoundaryMode::Wrap,
    ] {
        for pos in -3..4 {
            assert_eq!(boundary_index(pos, 1, mode), Some(0), "mode {}", mode);
        }
    }
}

#[test]
fn test_uniform_1d_reflect() {
    let frame = arr1(&[1.0, 2.0, 3.0, 4.0]).into_dyn();
    let out = uniform_filter(frame.view(), &[3], BoundaryMode::Reflect);
    assert_allclose(&out, &arr1(&[4.0 / 3.0, 2.0, 3.0, 11.0 / 3.0]).into_dyn());
}

#[test]
fn test_uniform_1d_constant() {
    let frame = arr1(&[3.0, 3.0, 3.0]).into_dyn();
    let out = uniform_filter(frame.view(), &[3], BoundaryMode::Constant(0.0));
    assert_allclose(&out, &arr1(&[2.0, 3.0, 2.0]).into_dyn());
}

#[test]
fn test_median_even_window_uses_upper_rank() {
    let frame = arr1(&[1.0, 5.0, 2.0, 8.0]).into_dyn();
    let out = median_filter(frame.view(), &[2], BoundaryMode::Reflect);
    assert_allclose(&out, &arr1(&[1.0, 5.0, 5.0, 8.0]).into_dyn());
}

#[test]
fn test_median_removes_hot_pixel() {
    let mut frame = ArrayD::from_elem(IxDyn(&[5, 5]), 0.1);
    frame[[2, 2]] = 1.0;
    let out = median_filter(frame.view(), &[3, 3], BoundaryMode::Reflect);
    assert!((out[[2, 2]] - 0.1).abs() < 1e-12);
}

#[test]
fn test_median_3x3_center() {
    #[rustfmt::skip]
    let frame = arr2(&[
        [9.0, 1.0, 8.0],
        [2.0, 7.0, 3.0],
        [6.0, 4.0, 5.0],
    ]).into_dyn();
    let out = median_filter(frame.view(), &[3, 3], BoundaryMode::Reflect);
    assert_eq!(out[[1, 1]], 5.0);
}

#[test]
fn test_unit_size_is_identity() {
    let frame = arange(24, &[4, 6]);
    assert_allclose(
        &median_filter(frame.view(), &[1, 1], BoundaryMode::Reflect),
        &frame,
    );
    assert_allclose(
        &uniform_filter(frame.view(), &[1, 1], BoundaryMode::Reflect),
        &frame,
    );
    assert_allclose(
        &gaussian_filter(frame.view(), &[0.0, 0.0], 4.0, BoundaryMode::Reflect),
        &frame,
    );
}

#[test]
fn test_gaussian_kernel_normalized_and_symmetric() {
    let kernel = gaussian_kernel_1d(2.0, 4.0);
    assert_eq!(kernel.len(), 2 * 8 + 1);
    let sum: f64 = kernel.iter().sum();
    assert!((sum - 1.0).abs() < 1e-12);
    for i in 0..kernel.len() / 2 {
        assert!((kernel[i] - kernel[kernel.len() - 1 - i]).abs() < 1e-15);
    }
    let center = kernel.len() / 2;
    assert!(kernel.iter().all(|&k| k <= kernel[center]));
}

#[test]
fn test_gaussian_impulse_reproduces_kernel() {
    let mut frame = ArrayD::zeros(IxDyn(&[21]));
    frame[[10]] = 1.0;
    let out = gaussian_filter(frame.view(), &[1.0], 4.0, BoundaryMode::Reflect);

    let kernel = gaussian_kernel_1d(1.0, 4.0);
    assert_eq!(kernel.len(), 9);
    let mut expected = ArrayD::zeros(IxDyn(&[21]));
    for (k, &w) in kernel.iter().enumerate() {
        expected[[6 + k]] = w;
    }
    assert_allclose(&out, &expected);
    // exp(-1/2) relative to the center tap
    assert!((kernel[5] / kernel[4] - (-0.5f64).exp()).abs() < 1e-12);
}

#[test]
fn test_gaussian_reflect_edge() {
    // A delta at the first sample reflects onto offset -1 as well.
    let mut frame = ArrayD::zeros(IxDyn(&[10]));
    frame[[0]] = 1.0;
    let out = gaussian_filter(frame.view(), &[1.0], 4.0, BoundaryMode::Reflect);

    let kernel = gaussian_kernel_1d(1.0, 4.0);
    let mut expected = ArrayD::zeros(IxDyn(&[10]));
    for j in 0..4 {
        expected[[j]] = kernel[4 - j] + kernel[3 - j];
    }
    expected[[4]] = kernel[0];
    assert_allclose(&out, &expected);

    let constant = gaussian_filter(frame.view(), &[1.0], 4.0, BoundaryMode::Constant(0.0));
    assert!((constant[[0]] - kernel[4]).abs() < 1e-15);
}

#[test]
fn test_median_constant_boundary() {
    let frame = arr1(&[1.0, 2.0, 3.0]).into_dyn();
    let zero_fill = median_filter(frame.view(), &[3], BoundaryMode::Constant(0.0));
    assert_allclose(&zero_fill, &arr1(&[1.0, 2.0, 2.0]).into_dyn());

    let high_fill = median_filter(frame.view(), &[3], BoundaryMode::Constant(10.0));
    assert_allclose(&high_fill, &arr1(&[2.0, 2.0, 3.0]).into_dyn());

    let reflect = median_filter(frame.view(), &[3], BoundaryMode::Reflect);
    assert_allclose(&reflect, &arr1(&[1.0, 2.0, 3.0]).into_dyn());
}

#[test]
fn test_gaussian_preserves_constant_frame() {
    let frame = ArrayD::from_elem(IxDyn(&[4, 5, 3]), 2.5);
    let out = gaussian_filter(frame.view(), &[1.0, 2.0, 0.5], 4.0, BoundaryMode::Reflect);
    assert_allclose(&out, &frame);
}

#[test]
fn test_scalar_size_matches_per_axis() {
    let frame = arange(24, &[4, 6]);
    let mode = BoundaryMode::Reflect;

    let pairs = [
        (Filter::median(2usize), Filter::median([2usize, 2])),
        (Filter::uniform(2usize), Filter::uniform([2usize, 2])),
        (Filter::gaussian(2.0), Filter::gaussian([2.0, 2.0])),
    ];
    for (scalar, per_axis) in pairs {
        let a = scalar.resolve(2, mode, 4.0).unwrap().apply(frame.view());
        let b = per_axis.resolve(2, mode, 4.0).unwrap().apply(frame.view());
        assert_eq!(a.shape(), &[4, 6]);
        assert_allclose(&a, &b);
    }
}

#[test]
fn test_resolve_rejects_bad_sizes() {
    let mode = BoundaryMode::Reflect;
    assert!(matches!(
        Filter::median(0usize).resolve(2, mode, 4.0),
        Err(Error::InvalidParameter { .. })
    ));
    assert!(matches!(
        Filter::uniform([2usize, 2]).resolve(3, mode, 4.0),
        Err(Error::RankMismatch { ndim: 3, actual: 2 })
    ));
    assert!(matches!(
        Filter::gaussian(-1.0).resolve(2, mode, 4.0),
        Err(Error::InvalidParameter { .. })
    ));
}

#[test]
fn test_filter_kind_display() {
    assert_eq!(Filter::median(3usize).kind().to_string(), "median");
    assert_eq!(Filter::gaussian(1.0).kind().to_string(), "gaussian");
    assert_eq!(Filter::uniform(3usize).kind().to_string(), "uniform");
    assert_eq!(BoundaryMode::Constant(1.0).to_string(), "constant");
}
