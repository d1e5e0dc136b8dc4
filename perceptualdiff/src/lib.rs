//! # perceptualdiff
//!
//! Decides whether two images are *perceptually* different, as opposed to
//! merely byte-different. Intended for rendering regression tests, where
//! imperceptible noise (dithering, driver rounding, compression) should not
//! fail a test but a visible defect should.
//!
//! The metric models:
//! - Luminance adaptation: threshold-vs-intensity (Ward Larson 1997)
//! - Spatial frequency sensitivity: contrast sensitivity (Barten 1989)
//! - Visual masking: texture hides small differences (Daly 1993)
//! - Color: CIE L*a*b* chroma difference, disabled in scotopic light
//!
//! Based on Yee, *A perceptual metric for production testing*, Journal of
//! Graphics Tools 9(4), 2004.
//!
//! ## Example
//!
//! ```rust
//! use perceptualdiff::{perceptual_diff, Img, PerceptualDiffParams, RGBA8};
//!
//! let width = 16;
//! let height = 16;
//! let gray = vec![RGBA8::new(128, 128, 128, 255); width * height];
//! let mut touched = gray.clone();
//! touched[5 * width + 5] = RGBA8::new(129, 129, 129, 255);
//!
//! let img_a = Img::new(gray, width, height);
//! let img_b = Img::new(touched, width, height);
//!
//! let params = PerceptualDiffParams::default().with_threshold_pixels(1);
//! let result = perceptual_diff(img_a.as_ref(), img_b.as_ref(), &params)?;
//!
//! // A one-level change in a single pixel is invisible.
//! assert!(result.passed());
//! assert_eq!(result.pixels_failed, 0);
//! # Ok::<(), perceptualdiff::PerceptualDiffError>(())
//! ```
//!
//! ## Features
//!
//! - **`rayon`** (default): run the per-row phases on rayon's thread pool.
//!   Results are identical with and without it.
//! - **`internals`**: Expose internal modules for testing/benchmarking
//!   (unstable API)
//!
//! ## References
//!
//! - <https://pdiff.sourceforge.net/>
//! - Ward Larson, Rushmeier, Piatko: *A visibility matching tone reproduction
//!   operator for high dynamic range scenes* (1997)

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::excessive_precision)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

// Internal modules - exposed with "internals" feature for testing/benchmarking
#[cfg(feature = "internals")]
pub mod classify;
#[cfg(not(feature = "internals"))]
pub(crate) mod classify;

#[cfg(feature = "internals")]
pub mod color;
#[cfg(not(feature = "internals"))]
pub(crate) mod color;

#[cfg(feature = "internals")]
pub mod consts;
#[cfg(not(feature = "internals"))]
pub(crate) mod consts;

mod diff;

#[cfg(feature = "internals")]
pub mod image;
#[cfg(not(feature = "internals"))]
pub(crate) mod image;

mod parallel;

#[cfg(feature = "internals")]
pub mod pyramid;
#[cfg(not(feature = "internals"))]
pub(crate) mod pyramid;

#[cfg(feature = "internals")]
pub mod vision;
#[cfg(not(feature = "internals"))]
pub(crate) mod vision;

use std::fmt;

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::{RGB8, RGBA8};

use crate::consts::{
    DEFAULT_COLOR_FACTOR, DEFAULT_FIELD_OF_VIEW, DEFAULT_GAMMA, DEFAULT_LUMINANCE,
    DEFAULT_THRESHOLD_PIXELS, MAX_FIELD_OF_VIEW, MIN_FIELD_OF_VIEW,
};

/// Error type for perceptualdiff operations.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum PerceptualDiffError {
    /// Image dimensions don't match.
    DimensionMismatch {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },
    /// A parameter is outside its accepted range.
    ///
    /// Only returned by [`PerceptualDiffParams::validate`]; the comparison
    /// itself does not check parameters.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f32,
        /// What the value must satisfy.
        reason: &'static str,
    },
}

impl fmt::Display for PerceptualDiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionMismatch { w1, h1, w2, h2 } => {
                write!(f, "image dimensions do not match: {w1}x{h1} vs {w2}x{h2}")
            }
            Self::InvalidParameter {
                name,
                value,
                reason,
            } => {
                write!(f, "invalid {name} {value}: {reason}")
            }
        }
    }
}

impl std::error::Error for PerceptualDiffError {}

/// Comparison parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use perceptualdiff::PerceptualDiffParams;
///
/// let params = PerceptualDiffParams::new()
///     .with_field_of_view(60.0)     // closer viewing distance
///     .with_threshold_pixels(0)     // any visible pixel fails
///     .with_luminance_only(true);   // ignore chroma
/// assert!(params.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptualDiffParams {
    field_of_view: f32,
    gamma: f32,
    luminance: f32,
    luminance_only: bool,
    color_factor: f32,
    threshold_pixels: usize,
    compute_difference: bool,
}

impl Default for PerceptualDiffParams {
    fn default() -> Self {
        Self {
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            gamma: DEFAULT_GAMMA,
            luminance: DEFAULT_LUMINANCE,
            luminance_only: false,
            color_factor: DEFAULT_COLOR_FACTOR,
            threshold_pixels: DEFAULT_THRESHOLD_PIXELS,
            compute_difference: false,
        }
    }
}

impl PerceptualDiffParams {
    /// Creates a new `PerceptualDiffParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the horizontal field of view in degrees (0.1 to 89.9).
    ///
    /// Together with the image width this fixes how many pixels span one
    /// degree of visual angle, which selects the adaptation scale and the
    /// spatial frequency of each pyramid band.
    #[must_use]
    pub fn with_field_of_view(mut self, field_of_view: f32) -> Self {
        self.field_of_view = field_of_view;
        self
    }

    /// Sets the gamma used to linearize 8-bit input.
    #[must_use]
    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the display's white luminance in cd/m².
    #[must_use]
    pub fn with_luminance(mut self, luminance: f32) -> Self {
        self.luminance = luminance;
        self
    }

    /// Only compare luminance; skip the chroma test.
    #[must_use]
    pub fn with_luminance_only(mut self, luminance_only: bool) -> Self {
        self.luminance_only = luminance_only;
        self
    }

    /// Sets how much chroma differences count, 0.0 (ignore) to 1.0 (full).
    #[must_use]
    pub fn with_color_factor(mut self, color_factor: f32) -> Self {
        self.color_factor = color_factor;
        self
    }

    /// Sets how many failing pixels are tolerated.
    ///
    /// The images pass when strictly fewer pixels than this fail, so `0`
    /// never passes unless the images are binary identical.
    #[must_use]
    pub fn with_threshold_pixels(mut self, threshold_pixels: usize) -> Self {
        self.threshold_pixels = threshold_pixels;
        self
    }

    /// Sets whether to paint the difference overlay.
    ///
    /// When `true`, the result carries an image with failing pixels in
    /// opaque red and passing pixels in opaque black.
    #[must_use]
    pub fn with_compute_difference(mut self, compute_difference: bool) -> Self {
        self.compute_difference = compute_difference;
        self
    }

    /// Returns the field of view in degrees.
    #[must_use]
    pub fn field_of_view(&self) -> f32 {
        self.field_of_view
    }

    /// Returns the gamma.
    #[must_use]
    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// Returns the display white luminance in cd/m².
    #[must_use]
    pub fn luminance(&self) -> f32 {
        self.luminance
    }

    /// Returns whether only luminance is compared.
    #[must_use]
    pub fn luminance_only(&self) -> bool {
        self.luminance_only
    }

    /// Returns the chroma weight.
    #[must_use]
    pub fn color_factor(&self) -> f32 {
        self.color_factor
    }

    /// Returns the number of tolerated failing pixels.
    #[must_use]
    pub fn threshold_pixels(&self) -> usize {
        self.threshold_pixels
    }

    /// Returns whether the difference overlay is painted.
    #[must_use]
    pub fn compute_difference(&self) -> bool {
        self.compute_difference
    }

    /// Checks every parameter against its accepted range.
    ///
    /// The comparison functions trust their parameters; call this at the
    /// boundary where parameters enter from users.
    ///
    /// # Errors
    /// Returns [`PerceptualDiffError::InvalidParameter`] for the first
    /// parameter out of range.
    pub fn validate(&self) -> Result<(), PerceptualDiffError> {
        let invalid = |name, value, reason| {
            Err(PerceptualDiffError::InvalidParameter {
                name,
                value,
                reason,
            })
        };

        if !(MIN_FIELD_OF_VIEW..=MAX_FIELD_OF_VIEW).contains(&self.field_of_view) {
            return invalid(
                "field of view",
                self.field_of_view,
                "must be between 0.1 and 89.9 degrees",
            );
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return invalid("gamma", self.gamma, "must be positive");
        }
        if !(self.luminance.is_finite() && self.luminance > 0.0) {
            return invalid("luminance", self.luminance, "must be positive");
        }
        if !(0.0..=1.0).contains(&self.color_factor) {
            return invalid(
                "color factor",
                self.color_factor,
                "must be between 0.0 and 1.0",
            );
        }
        Ok(())
    }
}

/// How a comparison was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every pixel is byte-identical; no perceptual work was done.
    BinaryIdentical,
    /// Fewer pixels than the threshold are visibly different.
    Indistinguishable,
    /// At least the threshold number of pixels are visibly different.
    VisiblyDifferent,
}

impl Outcome {
    /// True for the passing outcomes.
    #[must_use]
    pub fn passed(self) -> bool {
        !matches!(self, Self::VisiblyDifferent)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BinaryIdentical => "Images are binary identical",
            Self::Indistinguishable => "Images are perceptually indistinguishable",
            Self::VisiblyDifferent => "Images are visibly different",
        })
    }
}

/// Comparison result.
#[derive(Debug, Clone)]
pub struct CompareResult {
    /// How the comparison was decided.
    pub outcome: Outcome,
    /// Number of pixels that failed the perceptual test.
    pub pixels_failed: usize,
    /// Sum over all pixels of the luminance difference and, when the chroma
    /// test ran, the scaled chroma difference.
    ///
    /// The low-order bits depend on summation order.
    pub error_sum: f64,
    /// Difference overlay (only present if `compute_difference` was true).
    pub difference: Option<ImgVec<RGBA8>>,
}

impl CompareResult {
    /// True when the images are considered the same.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome.passed()
    }
}

fn check_dimensions<A, B>(img_a: ImgRef<A>, img_b: ImgRef<B>) -> Result<(), PerceptualDiffError> {
    let (w1, h1) = (img_a.width(), img_a.height());
    let (w2, h2) = (img_b.width(), img_b.height());

    if w1 != w2 || h1 != h2 {
        return Err(PerceptualDiffError::DimensionMismatch { w1, h1, w2, h2 });
    }
    Ok(())
}

/// Compares two RGBA images.
///
/// Alpha is expected to be premultiplied into the color channels; it only
/// takes part in the binary-identity check.
///
/// # Arguments
/// * `img_a` - First image (supports stride via ImgRef)
/// * `img_b` - Second image (supports stride via ImgRef)
/// * `params` - Comparison parameters
///
/// # Errors
/// Returns [`PerceptualDiffError::DimensionMismatch`] if the images differ
/// in size. No pixel work is done in that case.
///
/// # Example
/// ```rust
/// use perceptualdiff::{perceptual_diff, Img, Outcome, PerceptualDiffParams, RGBA8};
///
/// let img = Img::new(vec![RGBA8::new(10, 20, 30, 255); 64], 8, 8);
///
/// let result = perceptual_diff(img.as_ref(), img.as_ref(), &PerceptualDiffParams::default())?;
/// assert_eq!(result.outcome, Outcome::BinaryIdentical);
/// # Ok::<(), perceptualdiff::PerceptualDiffError>(())
/// ```
pub fn perceptual_diff(
    img_a: ImgRef<RGBA8>,
    img_b: ImgRef<RGBA8>,
    params: &PerceptualDiffParams,
) -> Result<CompareResult, PerceptualDiffError> {
    check_dimensions(img_a, img_b)?;
    Ok(diff::compute_perceptual_diff(
        img_a,
        img_b,
        params,
        params.compute_difference(),
    ))
}

/// Compares two opaque RGB images.
///
/// # Errors
/// Returns [`PerceptualDiffError::DimensionMismatch`] if the images differ
/// in size.
pub fn perceptual_diff_rgb(
    img_a: ImgRef<RGB8>,
    img_b: ImgRef<RGB8>,
    params: &PerceptualDiffParams,
) -> Result<CompareResult, PerceptualDiffError> {
    check_dimensions(img_a, img_b)?;
    let a = rgb_to_rgba(img_a);
    let b = rgb_to_rgba(img_b);
    Ok(diff::compute_perceptual_diff(
        a.as_ref(),
        b.as_ref(),
        params,
        params.compute_difference(),
    ))
}

/// Compares two RGBA images and paints the difference overlay into
/// `difference`, overwriting every pixel.
///
/// The returned result does not carry a second copy of the overlay.
///
/// # Errors
/// Returns [`PerceptualDiffError::DimensionMismatch`] if the images differ
/// in size, or if `difference` does not match them.
pub fn perceptual_diff_into(
    img_a: ImgRef<RGBA8>,
    img_b: ImgRef<RGBA8>,
    params: &PerceptualDiffParams,
    difference: &mut ImgVec<RGBA8>,
) -> Result<CompareResult, PerceptualDiffError> {
    check_dimensions(img_a, img_b)?;
    check_dimensions(img_a, difference.as_ref())?;

    let mut result = diff::compute_perceptual_diff(img_a, img_b, params, true);
    if let Some(painted) = result.difference.take() {
        for (dst, src) in difference.rows_mut().zip(painted.rows()) {
            dst.copy_from_slice(src);
        }
    }
    Ok(result)
}

fn rgb_to_rgba(img: ImgRef<RGB8>) -> ImgVec<RGBA8> {
    let pixels: Vec<RGBA8> = img
        .pixels()
        .map(|px| RGBA8::new(px.r, px.g, px.b, 255))
        .collect();
    Img::new(pixels, img.width(), img.height())
}
