//! Common test utilities for perceptualdiff tests.

#![allow(dead_code)]

pub mod generators;

use perceptualdiff::{perceptual_diff, CompareResult, ImgVec, PerceptualDiffParams, RGBA8};

/// Compares two images, panicking on a dimension mismatch.
#[track_caller]
pub fn compare(
    a: &ImgVec<RGBA8>,
    b: &ImgVec<RGBA8>,
    params: &PerceptualDiffParams,
) -> CompareResult {
    perceptual_diff(a.as_ref(), b.as_ref(), params)
        .unwrap_or_else(|e| panic!("comparison failed: {e}"))
}

/// Number of pixels painted as failing in an overlay.
pub fn count_red(overlay: &ImgVec<RGBA8>) -> usize {
    overlay
        .buf()
        .iter()
        .filter(|&&px| px == RGBA8::new(255, 0, 0, 255))
        .count()
}
