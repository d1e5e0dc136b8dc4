//! Per-pixel visibility test.
//!
//! For every pixel the classifier:
//! 1. takes the local adaptation luminance from a pyramid level chosen once
//!    per comparison from the field of view,
//! 2. measures band-pass contrast in each pyramid band of both images,
//! 3. turns those contrasts into a masking-weighted detectability factor,
//! 4. tests the luminance difference against `factor * tvi(adaptation)`,
//! 5. optionally tests the a*/b* chroma difference against `factor`.

use crate::color::ColorPlanes;
use crate::consts::{
    CONTRAST_BANDS, CSF_PEAK_CPD, CSF_REFERENCE_LUMINANCE, MAX_FACTOR, MAX_PYR_LEVELS,
    MIN_FACTOR, MIN_LUMINANCE, SCOTOPIC_LUMINANCE,
};
use crate::pyramid::LaplacianPyramid;
use crate::vision::{csf, mask, tvi};

/// Number of pixels spanning one degree of visual angle for a given
/// horizontal field of view in degrees.
#[must_use]
pub fn num_one_degree_pixels(field_of_view: f32) -> f32 {
    (2.0 * (field_of_view.to_radians() * 0.5).tan()).to_degrees()
}

/// Picks the pyramid level used for luminance adaptation.
///
/// Walks the levels with a pixel footprint that starts at 1 and doubles per
/// level, stopping at the first level whose footprint exceeds
/// `num_one_degree_pixels`. Saturates at the coarsest level.
#[must_use]
pub fn adaptation_level(num_one_degree_pixels: f32) -> usize {
    let mut num_pixels = 1.0f32;
    let mut level = 0;
    for i in 0..MAX_PYR_LEVELS {
        level = i;
        if num_pixels > num_one_degree_pixels {
            break;
        }
        num_pixels *= 2.0;
    }
    level
}

/// Spatial frequency of each pyramid level and the sensitivity weight of
/// each contrast band.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    /// Cycles per degree, halving per level.
    pub cpd: [f32; MAX_PYR_LEVELS],
    /// `csf_max / csf(cpd[band], 100)` for each contrast band. Infinite for
    /// bands far above the visible range.
    pub weights: [f32; CONTRAST_BANDS],
}

impl FrequencyTable {
    /// Builds the table for an image `width` pixels wide viewed with the
    /// given horizontal field of view.
    #[must_use]
    pub fn new(field_of_view: f32, width: usize) -> Self {
        let pixels_per_degree = width as f32 / num_one_degree_pixels(field_of_view);

        let mut cpd = [0.0f32; MAX_PYR_LEVELS];
        cpd[0] = 0.5 * pixels_per_degree;
        for i in 1..MAX_PYR_LEVELS {
            cpd[i] = 0.5 * cpd[i - 1];
        }

        let csf_max = csf(CSF_PEAK_CPD, CSF_REFERENCE_LUMINANCE);
        let weights = std::array::from_fn(|i| csf_max / csf(cpd[i], CSF_REFERENCE_LUMINANCE));

        Self { cpd, weights }
    }
}

/// Masking-weighted detectability factor for one pixel, clamped to
/// `[MIN_FACTOR, MAX_FACTOR]`.
///
/// `a` and `b` are the pyramid columns of the two images at the pixel,
/// `adapt` the (floored) adaptation luminance.
#[must_use]
pub fn detectability_factor(
    a: &[f32; MAX_PYR_LEVELS],
    b: &[f32; MAX_PYR_LEVELS],
    adapt: f32,
    frequencies: &FrequencyTable,
) -> f32 {
    let mut sum_contrast = 0.0f32;
    let mut factor = 0.0f32;
    for band in 0..CONTRAST_BANDS {
        let n1 = (a[band] - a[band + 1]).abs();
        let n2 = (b[band] - b[band + 1]).abs();
        let numerator = n1.max(n2);
        let d1 = a[band + 2].abs();
        let d2 = b[band + 2].abs();
        let denominator = d1.max(d2).max(MIN_LUMINANCE);
        let contrast = numerator / denominator;

        // A band whose sensitivity underflowed has an infinite weight; it only
        // contributes when it carries contrast.
        if contrast > 0.0 {
            let f_mask = mask(contrast * csf(frequencies.cpd[band], adapt));
            factor += contrast * frequencies.weights[band] * f_mask;
        }
        sum_contrast += contrast;
    }
    let sum_contrast = sum_contrast.max(MIN_LUMINANCE);
    (factor / sum_contrast).clamp(MIN_FACTOR, MAX_FACTOR)
}

/// Outcome of testing one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelVerdict {
    /// Whether every enabled test passed.
    pub passed: bool,
    /// Luminance difference plus, when the chroma test ran, the scaled
    /// chroma difference.
    pub error: f32,
}

/// Borrowed view of everything the per-pixel test reads.
///
/// Read-only, so one instance is shared by every worker.
pub struct PixelClassifier<'a> {
    pyramid_a: &'a LaplacianPyramid,
    pyramid_b: &'a LaplacianPyramid,
    planes_a: &'a ColorPlanes,
    planes_b: &'a ColorPlanes,
    frequencies: FrequencyTable,
    adaptation_level: usize,
    luminance_only: bool,
    color_factor: f32,
}

impl<'a> PixelClassifier<'a> {
    /// Sets up the shared per-comparison state: the frequency table and the
    /// adaptation level.
    #[must_use]
    pub fn new(
        planes_a: &'a ColorPlanes,
        pyramid_a: &'a LaplacianPyramid,
        planes_b: &'a ColorPlanes,
        pyramid_b: &'a LaplacianPyramid,
        field_of_view: f32,
        luminance_only: bool,
        color_factor: f32,
    ) -> Self {
        let frequencies = FrequencyTable::new(field_of_view, pyramid_a.width());
        let adaptation_level = adaptation_level(num_one_degree_pixels(field_of_view));
        Self {
            pyramid_a,
            pyramid_b,
            planes_a,
            planes_b,
            frequencies,
            adaptation_level,
            luminance_only,
            color_factor,
        }
    }

    /// Image width.
    #[must_use]
    pub fn width(&self) -> usize {
        self.pyramid_a.width()
    }

    /// Image height.
    #[must_use]
    pub fn height(&self) -> usize {
        self.pyramid_a.height()
    }

    /// The pyramid level adaptation luminance is read from.
    #[must_use]
    pub fn adaptation_level(&self) -> usize {
        self.adaptation_level
    }

    /// The frequency table in use.
    #[must_use]
    pub fn frequencies(&self) -> &FrequencyTable {
        &self.frequencies
    }

    /// Tests pixel `(x, y)`.
    #[must_use]
    pub fn classify(&self, x: usize, y: usize) -> PixelVerdict {
        let column_a = self.pyramid_a.column(x, y);
        let column_b = self.pyramid_b.column(x, y);

        let level = self.adaptation_level;
        let adapt = ((column_a[level] + column_b[level]) * 0.5).max(MIN_LUMINANCE);

        let factor = detectability_factor(&column_a, &column_b, adapt, &self.frequencies);

        let delta = (column_a[0] - column_b[0]).abs();
        let mut error = delta;

        // Pure luminance test. Only an exceeded threshold fails the pixel.
        let mut passed = true;
        if delta > factor * tvi(adapt) {
            passed = false;
        }

        if !self.luminance_only {
            // Color is not perceived in scotopic conditions.
            let color_scale = if adapt < SCOTOPIC_LUMINANCE {
                0.0
            } else {
                self.color_factor
            };
            let da = self.planes_a.a.get(x, y) - self.planes_b.a.get(x, y);
            let db = self.planes_a.b.get(x, y) - self.planes_b.b.get(x, y);
            let delta_e = (da * da + db * db) * color_scale;

            error += delta_e;
            if delta_e > factor {
                passed = false;
            }
        }

        PixelVerdict { passed, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::ImageF;

    fn planes(lum: f32, a: f32, b: f32, width: usize, height: usize) -> ColorPlanes {
        ColorPlanes {
            luminance: ImageF::filled(width, height, lum),
            a: ImageF::filled(width, height, a),
            b: ImageF::filled(width, height, b),
        }
    }

    #[test]
    fn test_num_one_degree_pixels() {
        // 2 * tan(22.5°) in degrees.
        let n = num_one_degree_pixels(45.0);
        assert!((n - 47.46).abs() < 0.01, "n = {n}");
    }

    #[test]
    fn test_adaptation_level() {
        assert_eq!(adaptation_level(0.5), 0);
        assert_eq!(adaptation_level(1.5), 1);
        assert_eq!(adaptation_level(3.0), 2);
        assert_eq!(adaptation_level(47.46), 6);
        assert_eq!(adaptation_level(64.0), 7);
        // Saturates at the coarsest level.
        assert_eq!(adaptation_level(1000.0), MAX_PYR_LEVELS - 1);
        assert_eq!(adaptation_level(num_one_degree_pixels(89.9)), MAX_PYR_LEVELS - 1);
    }

    #[test]
    fn test_frequency_table() {
        let table = FrequencyTable::new(45.0, 512);
        let expected_cpd0 = 0.5 * 512.0 / num_one_degree_pixels(45.0);
        assert!((table.cpd[0] - expected_cpd0).abs() < 1e-4);
        for i in 1..MAX_PYR_LEVELS {
            assert!((table.cpd[i] * 2.0 - table.cpd[i - 1]).abs() < 1e-6);
        }
        for &w in &table.weights {
            // Normalized by the peak, so never below one.
            assert!(w >= 1.0 - 1e-4 && w.is_finite(), "weight = {w}");
        }
    }

    #[test]
    fn test_flat_images_have_unit_factor() {
        let table = FrequencyTable::new(45.0, 64);
        let column = [20.0f32; MAX_PYR_LEVELS];
        let factor = detectability_factor(&column, &column, 20.0, &table);
        assert_eq!(factor, MIN_FACTOR);
    }

    #[test]
    fn test_factor_is_clamped() {
        let table = FrequencyTable::new(45.0, 64);
        let mut a = [0.0f32; MAX_PYR_LEVELS];
        let b = [0.0f32; MAX_PYR_LEVELS];
        for (i, v) in a.iter_mut().enumerate() {
            *v = if i % 2 == 0 { 1000.0 } else { 1.0 };
        }
        let factor = detectability_factor(&a, &b, 100.0, &table);
        assert!((MIN_FACTOR..=MAX_FACTOR).contains(&factor), "factor = {factor}");
    }

    #[test]
    fn test_factor_stays_finite_far_above_visible_frequencies() {
        // 64 pixels across a 0.1 degree field: every band is beyond what the
        // eye resolves.
        let table = FrequencyTable::new(0.1, 64);
        assert!(table.cpd[0] > 300.0);

        let flat = [20.0f32; MAX_PYR_LEVELS];
        let factor = detectability_factor(&flat, &flat, 20.0, &table);
        assert_eq!(factor, MIN_FACTOR);

        let mut edge = flat;
        edge[0] = 100.0;
        let factor = detectability_factor(&edge, &flat, 1e-5, &table);
        assert!(factor.is_finite(), "factor = {factor}");
        assert!((MIN_FACTOR..=MAX_FACTOR).contains(&factor));
    }

    #[test]
    fn test_unchanged_pixels_pass_at_any_field_of_view() {
        let a = planes(20.0, 0.0, 0.0, 64, 4);
        let mut b = a.clone();
        b.luminance.set(10, 2, 21.0);
        let pa = LaplacianPyramid::new(&a.luminance);
        let pb = LaplacianPyramid::new(&b.luminance);

        for fov in [0.1f32, 1.0, 45.0, 89.9] {
            let classifier = PixelClassifier::new(&a, &pa, &b, &pb, fov, true, 1.0);
            let v = classifier.classify(40, 1);
            assert!(v.passed, "fov {fov}");
            assert_eq!(v.error, 0.0);
            let v = classifier.classify(10, 2);
            assert!(v.error.is_finite(), "fov {fov}");
        }
    }

    #[test]
    fn test_identical_planes_pass_with_zero_error() {
        let p = planes(20.0, 3.0, -4.0, 8, 8);
        let pyr = LaplacianPyramid::new(&p.luminance);
        let classifier = PixelClassifier::new(&p, &pyr, &p, &pyr, 45.0, false, 1.0);
        for y in 0..8 {
            for x in 0..8 {
                let v = classifier.classify(x, y);
                assert!(v.passed);
                assert_eq!(v.error, 0.0);
            }
        }
    }

    #[test]
    fn test_large_luminance_step_fails() {
        let a = planes(20.0, 0.0, 0.0, 8, 8);
        let b = planes(40.0, 0.0, 0.0, 8, 8);
        let pa = LaplacianPyramid::new(&a.luminance);
        let pb = LaplacianPyramid::new(&b.luminance);
        let classifier = PixelClassifier::new(&a, &pa, &b, &pb, 45.0, true, 1.0);
        let v = classifier.classify(3, 3);
        assert!(!v.passed);
        assert!((v.error - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_chroma_test_respects_luminance_only_and_scotopic_ramp() {
        let a = planes(50.0, 10.0, 0.0, 8, 8);
        let b = planes(50.0, -10.0, 0.0, 8, 8);
        let pa = LaplacianPyramid::new(&a.luminance);
        let pb = LaplacianPyramid::new(&b.luminance);

        let with_color = PixelClassifier::new(&a, &pa, &b, &pb, 45.0, false, 1.0);
        let v = with_color.classify(0, 0);
        assert!(!v.passed);
        assert!((v.error - 400.0).abs() < 1e-2);

        let half_color = PixelClassifier::new(&a, &pa, &b, &pb, 45.0, false, 0.5);
        assert!((half_color.classify(0, 0).error - 200.0).abs() < 1e-2);

        let luminance_only = PixelClassifier::new(&a, &pa, &b, &pb, 45.0, true, 1.0);
        let v = luminance_only.classify(0, 0);
        assert!(v.passed);
        assert_eq!(v.error, 0.0);

        // Same chroma difference in the dark is ignored.
        let dark_a = planes(5.0, 10.0, 0.0, 8, 8);
        let dark_b = planes(5.0, -10.0, 0.0, 8, 8);
        let pda = LaplacianPyramid::new(&dark_a.luminance);
        let pdb = LaplacianPyramid::new(&dark_b.luminance);
        let dark = PixelClassifier::new(&dark_a, &pda, &dark_b, &pdb, 45.0, false, 1.0);
        let v = dark.classify(0, 0);
        assert!(v.passed);
        assert_eq!(v.error, 0.0);
    }

    #[test]
    fn test_black_images_use_luminance_floor() {
        let a = planes(0.0, 0.0, 0.0, 4, 4);
        let pa = LaplacianPyramid::new(&a.luminance);
        let classifier = PixelClassifier::new(&a, &pa, &a, &pa, 45.0, false, 1.0);
        let v = classifier.classify(1, 1);
        assert!(v.passed);
        assert!(v.error.is_finite());
    }
}
