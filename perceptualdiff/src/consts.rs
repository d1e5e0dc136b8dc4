//! Constants for the perceptual metric.
//!
//! Color matrix values are for Adobe RGB (1998) with a D65 white point
//! (Bruce Lindbloom's tables). Vision-model constants come from the
//! published models they are named after.

// ============================================================================
// Pyramid
// ============================================================================

/// Number of levels in the blur pyramid.
pub const MAX_PYR_LEVELS: usize = 8;

/// Number of band-pass contrast bands derived from the pyramid.
pub const CONTRAST_BANDS: usize = MAX_PYR_LEVELS - 2;

/// Separable low-pass kernel applied between pyramid levels.
pub const PYRAMID_KERNEL: [f32; 5] = [0.05, 0.25, 0.4, 0.25, 0.05];

const _: () = assert!(MAX_PYR_LEVELS > 2, "MAX_PYR_LEVELS must be greater than 2");

// ============================================================================
// Color conversion
// ============================================================================

/// Adobe RGB (1998) to CIE XYZ, row-major.
pub const ADOBE_RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.576_700, 0.185_556, 0.188_212],
    [0.297_361, 0.627_355, 0.075_284_7],
    [0.027_032_8, 0.070_687_9, 0.991_248],
];

/// CIE L*a*b* epsilon (216 / 24389).
pub const LAB_EPSILON: f32 = 216.0 / 24389.0;
/// CIE L*a*b* kappa (24389 / 27).
pub const LAB_KAPPA: f32 = 24389.0 / 27.0;

// ============================================================================
// Classification
// ============================================================================

/// Floor applied to luminances and contrast denominators before they reach
/// the vision model.
pub const MIN_LUMINANCE: f32 = 1e-5;

/// Adaptation luminance (cd/m²) below which the chroma test is disabled.
pub const SCOTOPIC_LUMINANCE: f32 = 10.0;

/// Peak of the contrast sensitivity function at 100 cd/m².
pub const CSF_PEAK_CPD: f32 = 3.248;
/// Luminance at which the frequency weights are normalized.
pub const CSF_REFERENCE_LUMINANCE: f32 = 100.0;

/// Lower clamp for the masking-weighted detectability factor.
pub const MIN_FACTOR: f32 = 1.0;
/// Upper clamp for the masking-weighted detectability factor.
pub const MAX_FACTOR: f32 = 10.0;

/// Rows handled per work item during classification.
pub const ROWS_PER_CHUNK: usize = 60;

// ============================================================================
// Defaults
// ============================================================================

/// Default field of view in degrees.
pub const DEFAULT_FIELD_OF_VIEW: f32 = 45.0;
/// Default gamma used to linearize 8-bit input.
pub const DEFAULT_GAMMA: f32 = 2.2;
/// Default display white luminance in cd/m².
pub const DEFAULT_LUMINANCE: f32 = 100.0;
/// Default chroma weight.
pub const DEFAULT_COLOR_FACTOR: f32 = 1.0;
/// Default number of failing pixels tolerated.
pub const DEFAULT_THRESHOLD_PIXELS: usize = 100;

/// Smallest accepted field of view in degrees.
pub const MIN_FIELD_OF_VIEW: f32 = 0.1;
/// Largest accepted field of view in degrees.
pub const MAX_FIELD_OF_VIEW: f32 = 89.9;
