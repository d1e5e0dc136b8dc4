//! Color conversion: gamma-encoded 8-bit RGB to CIE L*a*b* and absolute
//! luminance.
//!
//! Input is assumed to be Adobe RGB (1998) with a D65 white point. Each
//! channel is normalized to [0, 1] and raised to `gamma` to linearize it,
//! mapped to XYZ, and then to L*a*b* relative to the XYZ of linear white.
//! The absolute luminance used by the vision model is `Y` scaled by the
//! display's white luminance.

use std::sync::LazyLock;

use imgref::ImgRef;
use rgb::RGBA8;

use crate::consts::{ADOBE_RGB_TO_XYZ, LAB_EPSILON, LAB_KAPPA};
use crate::image::ImageF;
use crate::parallel::for_each_chunk_mut;

/// A CIE XYZ triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// The a*b* chroma of a color and the absolute luminance it was derived
/// from. Lightness is carried by `luminance`, so L* is not kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabLuminance {
    pub a: f32,
    pub b: f32,
    /// Absolute luminance in cd/m².
    pub luminance: f32,
}

/// XYZ of full-intensity linear white. Computed on first use, read-only after.
static REFERENCE_WHITE: LazyLock<Xyz> = LazyLock::new(|| adobe_rgb_to_xyz(1.0, 1.0, 1.0));

/// Returns the reference white used for L*a*b* conversion.
#[cfg(any(test, feature = "internals"))]
#[must_use]
pub fn reference_white() -> Xyz {
    *REFERENCE_WHITE
}

/// Linearizes an 8-bit gamma-encoded channel value.
#[inline]
#[must_use]
pub fn to_linear(v: u8, gamma: f32) -> f32 {
    (f32::from(v) / 255.0).powf(gamma)
}

/// Converts linear Adobe RGB (1998) to CIE XYZ.
#[inline]
#[must_use]
pub fn adobe_rgb_to_xyz(r: f32, g: f32, b: f32) -> Xyz {
    let m = &ADOBE_RGB_TO_XYZ;
    Xyz {
        x: r * m[0][0] + g * m[0][1] + b * m[0][2],
        y: r * m[1][0] + g * m[1][1] + b * m[1][2],
        z: r * m[2][0] + g * m[2][1] + b * m[2][2],
    }
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

/// Converts CIE XYZ to CIE L*a*b*, returning `(L, a, b)`.
#[must_use]
pub fn xyz_to_lab(xyz: Xyz) -> (f32, f32, f32) {
    let white = &*REFERENCE_WHITE;
    let fx = lab_f(xyz.x / white.x);
    let fy = lab_f(xyz.y / white.y);
    let fz = lab_f(xyz.z / white.z);
    (116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

/// Converts one 8-bit RGB triple to L*a*b* and absolute luminance.
#[must_use]
pub fn rgb_to_lab_and_luminance(
    r: u8,
    g: u8,
    b: u8,
    gamma: f32,
    luminance_scale: f32,
) -> LabLuminance {
    let xyz = adobe_rgb_to_xyz(to_linear(r, gamma), to_linear(g, gamma), to_linear(b, gamma));
    let (_, a, b) = xyz_to_lab(xyz);
    LabLuminance {
        a,
        b,
        luminance: xyz.y * luminance_scale,
    }
}

/// Per-image planes consumed by the classifier.
#[derive(Debug, Clone)]
pub struct ColorPlanes {
    /// Absolute luminance, cd/m².
    pub luminance: ImageF,
    /// a* chroma.
    pub a: ImageF,
    /// b* chroma.
    pub b: ImageF,
}

impl ColorPlanes {
    /// Converts a whole image. Rows are converted in parallel.
    ///
    /// Alpha is ignored; it is expected to be premultiplied into the color
    /// channels already.
    #[must_use]
    pub fn from_image(img: ImgRef<RGBA8>, gamma: f32, luminance_scale: f32) -> Self {
        let width = img.width();
        let height = img.height();

        let stride = img.stride();
        let buf = img.buf();

        // Interleaved (luminance, a*, b*) so a single chunked pass writes all three.
        let mut packed = vec![[0.0f32; 3]; width * height];
        for_each_chunk_mut(&mut packed, width, |y, out| {
            let row = &buf[y * stride..y * stride + width];
            for (px, dst) in row.iter().zip(out.iter_mut()) {
                let c = rgb_to_lab_and_luminance(px.r, px.g, px.b, gamma, luminance_scale);
                *dst = [c.luminance, c.a, c.b];
            }
        });

        let mut luminance = Vec::with_capacity(packed.len());
        let mut a = Vec::with_capacity(packed.len());
        let mut b = Vec::with_capacity(packed.len());
        for [lum, ca, cb] in packed {
            luminance.push(lum);
            a.push(ca);
            b.push(cb);
        }

        Self {
            luminance: ImageF::from_vec(luminance, width, height),
            a: ImageF::from_vec(a, width, height),
            b: ImageF::from_vec(b, width, height),
        }
    }

    /// Image width.
    #[cfg(any(test, feature = "internals"))]
    #[must_use]
    pub fn width(&self) -> usize {
        self.luminance.width()
    }

    /// Image height.
    #[cfg(any(test, feature = "internals"))]
    #[must_use]
    pub fn height(&self) -> usize {
        self.luminance.height()
    }
}
