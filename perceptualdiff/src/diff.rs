//! Main comparison pipeline.
//!
//! Ties the stages together: binary-identity fast path, color conversion,
//! pyramid construction, per-pixel classification, and reduction of the
//! per-pixel verdicts into a failed-pixel count and error sum.

use std::ops::Range;

use imgref::{ImgRef, ImgVec};
use log::debug;
use rgb::RGBA8;

use crate::classify::PixelClassifier;
use crate::color::ColorPlanes;
use crate::consts::ROWS_PER_CHUNK;
use crate::parallel::{map_chunks_mut, map_range};
use crate::pyramid::LaplacianPyramid;
use crate::{CompareResult, Outcome, PerceptualDiffParams};

/// Overlay color for pixels that fail.
pub(crate) const FAIL_COLOR: RGBA8 = RGBA8 {
    r: 255,
    g: 0,
    b: 0,
    a: 255,
};

/// Overlay color for pixels that pass.
pub(crate) const PASS_COLOR: RGBA8 = RGBA8 {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};

/// Failed-pixel count and error sum for a run of rows.
#[derive(Debug, Default, Clone, Copy)]
struct Partial {
    pixels_failed: usize,
    error_sum: f64,
}

/// True when every pixel, alpha included, is byte-identical.
fn binary_identical(img_a: ImgRef<RGBA8>, img_b: ImgRef<RGBA8>) -> bool {
    img_a.rows().zip(img_b.rows()).all(|(ra, rb)| ra == rb)
}

/// Classifies `rows`, painting into `overlay` (which then covers exactly
/// those rows) when given.
fn classify_rows(
    classifier: &PixelClassifier<'_>,
    rows: Range<usize>,
    mut overlay: Option<&mut [RGBA8]>,
) -> Partial {
    let width = classifier.width();
    let first = rows.start;
    let mut partial = Partial::default();

    for y in rows {
        let mut row_failed = 0usize;
        let mut row_error = 0.0f64;
        for x in 0..width {
            let verdict = classifier.classify(x, y);
            row_error += f64::from(verdict.error);
            if !verdict.passed {
                row_failed += 1;
            }
            if let Some(out) = overlay.as_deref_mut() {
                out[(y - first) * width + x] = if verdict.passed {
                    PASS_COLOR
                } else {
                    FAIL_COLOR
                };
            }
        }
        partial.pixels_failed += row_failed;
        partial.error_sum += row_error;
    }

    partial
}

/// Runs the classifier over the whole image in row chunks and merges the
/// per-chunk partials in chunk order.
fn aggregate(
    classifier: &PixelClassifier<'_>,
    paint: bool,
) -> (usize, f64, Option<ImgVec<RGBA8>>) {
    let width = classifier.width();
    let height = classifier.height();

    let (partials, difference) = if paint {
        let mut buf = vec![PASS_COLOR; width * height];
        let partials = map_chunks_mut(&mut buf, ROWS_PER_CHUNK * width, |chunk, out| {
            let start = chunk * ROWS_PER_CHUNK;
            let end = start + out.len() / width;
            classify_rows(classifier, start..end, Some(out))
        });
        (partials, Some(ImgVec::new(buf, width, height)))
    } else {
        let chunks = height.div_ceil(ROWS_PER_CHUNK);
        let partials = map_range(chunks, |chunk| {
            let start = chunk * ROWS_PER_CHUNK;
            let end = (start + ROWS_PER_CHUNK).min(height);
            classify_rows(classifier, start..end, None)
        });
        (partials, None)
    };

    let mut pixels_failed = 0usize;
    let mut error_sum = 0.0f64;
    for partial in partials {
        pixels_failed += partial.pixels_failed;
        error_sum += partial.error_sum;
    }

    (pixels_failed, error_sum, difference)
}

/// Compares two images of equal dimensions.
///
/// The caller has already checked dimensions.
pub(crate) fn compute_perceptual_diff(
    img_a: ImgRef<RGBA8>,
    img_b: ImgRef<RGBA8>,
    params: &PerceptualDiffParams,
    compute_difference: bool,
) -> CompareResult {
    let width = img_a.width();
    let height = img_a.height();

    if binary_identical(img_a, img_b) {
        debug!("images are binary identical ({width}x{height})");
        return CompareResult {
            outcome: Outcome::BinaryIdentical,
            pixels_failed: 0,
            error_sum: 0.0,
            difference: compute_difference
                .then(|| ImgVec::new(vec![PASS_COLOR; width * height], width, height)),
        };
    }

    debug!("converting RGB to XYZ ({width}x{height})");
    let planes_a = ColorPlanes::from_image(img_a, params.gamma(), params.luminance());
    let planes_b = ColorPlanes::from_image(img_b, params.gamma(), params.luminance());

    debug!("constructing Laplacian pyramids");
    let pyramid_a = LaplacianPyramid::new(&planes_a.luminance);
    let pyramid_b = LaplacianPyramid::new(&planes_b.luminance);

    let classifier = PixelClassifier::new(
        &planes_a,
        &pyramid_a,
        &planes_b,
        &pyramid_b,
        params.field_of_view(),
        params.luminance_only(),
        params.color_factor(),
    );
    debug!(
        "performing test (adaptation level {}, {:.4} cpd at level 0)",
        classifier.adaptation_level(),
        classifier.frequencies().cpd[0]
    );

    let (pixels_failed, error_sum, difference) = aggregate(&classifier, compute_difference);

    let outcome = if pixels_failed < params.threshold_pixels() {
        Outcome::Indistinguishable
    } else {
        Outcome::VisiblyDifferent
    };
    debug!("{pixels_failed} pixels failed, error sum {error_sum:.6}: {outcome}");

    CompareResult {
        outcome,
        pixels_failed,
        error_sum,
        difference,
    }
}
