//! Shared image generation and distortion functions for perceptualdiff tests.
//!
//! These produce deterministic synthetic images using an LCG PRNG,
//! ensuring identical test inputs across all platforms.

#![allow(dead_code)]

use perceptualdiff::{Img, ImgVec, RGBA8};

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }
}

// ============================================================================
// Image Generation Functions
// ============================================================================

/// Generate uniform color image
pub fn gen_uniform(width: usize, height: usize, r: u8, g: u8, b: u8) -> ImgVec<RGBA8> {
    Img::new(vec![RGBA8::new(r, g, b, 255); width * height], width, height)
}

/// Generate uniform gray image
pub fn gen_gray(width: usize, height: usize, v: u8) -> ImgVec<RGBA8> {
    gen_uniform(width, height, v, v, v)
}

/// Generate horizontal gradient (grayscale)
pub fn gen_gradient_h(width: usize, height: usize) -> ImgVec<RGBA8> {
    let mut pixels = Vec::with_capacity(width * height);
    for _y in 0..height {
        for x in 0..width {
            let val = if width > 1 {
                (x * 255 / (width - 1)) as u8
            } else {
                128
            };
            pixels.push(RGBA8::new(val, val, val, 255));
        }
    }
    Img::new(pixels, width, height)
}

/// Generate RGB color gradient
pub fn gen_color_gradient(width: usize, height: usize) -> ImgVec<RGBA8> {
    let mut pixels = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let r = if width > 1 {
                (x * 255 / (width - 1)) as u8
            } else {
                128
            };
            let g = if height > 1 {
                (y * 255 / (height - 1)) as u8
            } else {
                128
            };
            pixels.push(RGBA8::new(r, g, 128, 255));
        }
    }
    Img::new(pixels, width, height)
}

/// Generate random noise image
pub fn gen_random(width: usize, height: usize, seed: u64) -> ImgVec<RGBA8> {
    let mut rng = Lcg::new(seed);
    let pixels = (0..width * height)
        .map(|_| RGBA8::new(rng.next_u8(), rng.next_u8(), rng.next_u8(), 255))
        .collect();
    Img::new(pixels, width, height)
}

// ============================================================================
// Distortion Functions
// ============================================================================

/// Add uniform noise in `[-amplitude, amplitude]` to gray pixels.
///
/// One random draw per pixel, applied to all three channels.
pub fn add_gray_noise(img: &ImgVec<RGBA8>, seed: u64, amplitude: u8) -> ImgVec<RGBA8> {
    let mut rng = Lcg::new(seed);
    let span = 2 * i32::from(amplitude) + 1;
    let pixels = img
        .pixels()
        .map(|px| {
            let delta = i32::from(rng.next_u8()) % span - i32::from(amplitude);
            let v = (i32::from(px.r) + delta).clamp(0, 255) as u8;
            RGBA8::new(v, v, v, px.a)
        })
        .collect();
    Img::new(pixels, img.width(), img.height())
}

/// Replace a `size`×`size` block centered in the image with `color`.
pub fn paint_center_block(img: &ImgVec<RGBA8>, size: usize, color: RGBA8) -> ImgVec<RGBA8> {
    let mut out = img.clone();
    let (w, h) = (img.width(), img.height());
    let x0 = (w - size) / 2;
    let y0 = (h - size) / 2;
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            out[(x, y)] = color;
        }
    }
    out
}

/// Copy an image into a buffer with `pad` extra pixels per row.
pub fn with_stride_padding(img: &ImgVec<RGBA8>, pad: usize) -> ImgVec<RGBA8> {
    let (w, h) = (img.width(), img.height());
    let stride = w + pad;
    let mut buf = vec![RGBA8::new(7, 7, 7, 7); stride * h];
    for (y, row) in img.rows().enumerate() {
        buf[y * stride..y * stride + w].copy_from_slice(row);
    }
    Img::new_stride(buf, w, h, stride)
}
