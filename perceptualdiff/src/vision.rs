//! Psychophysical model functions.
//!
//! - [`tvi`]: threshold-vs-intensity, Ward Larson (SIGGRAPH 1997)
//! - [`csf`]: contrast sensitivity, Barten (SPIE 1989)
//! - [`mask`]: visual masking, Daly (1993)
//!
//! All three are total over strictly positive inputs. The classifier floors
//! luminances and contrast denominators before calling in here.

/// Visibility threshold in cd/m² for an observer adapted to
/// `adaptation_luminance` cd/m².
///
/// Piecewise in `log10(adaptation_luminance)` with breakpoints at -3.94,
/// -1.44, -0.0184 and 1.9.
#[must_use]
pub fn tvi(adaptation_luminance: f32) -> f32 {
    let log_a = adaptation_luminance.log10();

    let r = if log_a < -3.94 {
        -2.86
    } else if log_a < -1.44 {
        (0.405 * log_a + 1.6).powf(2.18) - 2.86
    } else if log_a < -0.0184 {
        log_a - 0.395
    } else if log_a < 1.9 {
        (0.249 * log_a + 0.65).powf(2.7) - 0.72
    } else {
        log_a - 1.255
    };

    10.0f32.powf(r)
}

/// Contrast sensitivity at `cpd` cycles per degree and luminance `lum` cd/m².
///
/// Barten's `a * cpd * exp(-b*cpd) * sqrt(1 + 0.06 * exp(b*cpd))`, with the
/// decaying exponential moved under the square root. The two forms are equal,
/// but this one only ever evaluates `exp` of a non-positive argument, so it
/// decays to zero at very high frequencies instead of becoming `0 * inf`.
#[must_use]
pub fn csf(cpd: f32, lum: f32) -> f32 {
    let a = 440.0 * (1.0 + 0.7 / lum).powf(-0.2);
    let b = 0.3 * (1.0 + 100.0 / lum).powf(0.15);

    let decay = (-b * cpd).exp();
    a * cpd * (decay * decay + 0.06 * decay).sqrt()
}

/// Threshold elevation caused by a masking signal of the given contrast.
#[must_use]
pub fn mask(contrast: f32) -> f32 {
    let a = (392.498 * contrast).powf(0.7);
    let b = (0.0153 * a).powf(4.0);
    (1.0 + b).powf(0.25)
}
