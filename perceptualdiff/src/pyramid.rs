//! Blur pyramid over a luminance field.
//!
//! Level 0 is the input. Each further level is the previous one convolved
//! with the separable kernel [`PYRAMID_KERNEL`] horizontally and then
//! vertically. Unlike a classic Laplacian pyramid nothing is decimated: every
//! level keeps the source resolution, so `(x, y)` addresses the same pixel at
//! every level and band-pass values are plain differences of adjacent levels.
//!
//! Borders are mirrored without repeating the first sample (`-1 -> 1`) but
//! with repeating the last one (`size -> size - 1`).
//!
//! Levels depend on each other and are built in order; rows within a level
//! are independent and run on the worker pool.

use crate::consts::{MAX_PYR_LEVELS, PYRAMID_KERNEL};
use crate::image::ImageF;
use crate::parallel::for_each_chunk_mut;

/// Fixed-depth blur pyramid.
#[derive(Debug, Clone)]
pub struct LaplacianPyramid {
    levels: [ImageF; MAX_PYR_LEVELS],
}

impl LaplacianPyramid {
    /// Builds all [`MAX_PYR_LEVELS`] levels from `field`.
    ///
    /// A field with at most one pixel has nothing to blur; every level is a
    /// copy of it.
    #[must_use]
    pub fn new(field: &ImageF) -> Self {
        let mut levels: [ImageF; MAX_PYR_LEVELS] = std::array::from_fn(|_| ImageF::new(0, 0));
        levels[0] = field.clone();
        for i in 1..MAX_PYR_LEVELS {
            levels[i] = if field.len() <= 1 {
                levels[i - 1].clone()
            } else {
                convolve(&levels[i - 1])
            };
        }
        Self { levels }
    }

    /// Width of every level.
    #[must_use]
    pub fn width(&self) -> usize {
        self.levels[0].width()
    }

    /// Height of every level.
    #[must_use]
    pub fn height(&self) -> usize {
        self.levels[0].height()
    }

    /// Returns one level.
    ///
    /// # Panics
    /// Panics if `level >= MAX_PYR_LEVELS`.
    #[cfg(any(test, feature = "internals"))]
    #[inline]
    #[must_use]
    pub fn level(&self, level: usize) -> &ImageF {
        assert!(level < MAX_PYR_LEVELS, "pyramid level {level} out of range");
        &self.levels[level]
    }

    /// Value of pixel `(x, y)` at `level`.
    ///
    /// # Panics
    /// Panics if `level >= MAX_PYR_LEVELS` or the pixel is out of bounds.
    #[cfg(any(test, feature = "internals"))]
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, y: usize, level: usize) -> f32 {
        self.level(level).get(x, y)
    }

    /// Values of pixel `(x, y)` at every level, finest first.
    #[inline]
    #[must_use]
    pub fn column(&self, x: usize, y: usize) -> [f32; MAX_PYR_LEVELS] {
        let index = y * self.width() + x;
        std::array::from_fn(|level| self.levels[level].data()[index])
    }
}

/// Mirrors an out-of-range coordinate back into `[0, size)`.
///
/// Repeats until in range so that sizes smaller than the kernel radius are
/// still well defined.
#[inline]
fn reflect(mut i: isize, size: isize) -> usize {
    debug_assert!(size > 0);
    while i < 0 || i >= size {
        if i < 0 {
            i = -i;
        } else {
            i = 2 * size - i - 1;
        }
    }
    i as usize
}

/// One separable pass of [`PYRAMID_KERNEL`] with mirrored borders.
fn convolve(input: &ImageF) -> ImageF {
    let width = input.width();
    let height = input.height();
    let iwidth = width as isize;
    let iheight = height as isize;
    let half = (PYRAMID_KERNEL.len() / 2) as isize;

    // Horizontal pass.
    let mut temp = ImageF::new(width, height);
    for_each_chunk_mut(temp.data_mut(), width, |y, out| {
        let row = input.row(y);
        for (x, dst) in out.iter_mut().enumerate() {
            let ix = x as isize;
            let mut sum = 0.0f32;
            for (k, &weight) in PYRAMID_KERNEL.iter().enumerate() {
                sum += weight * row[reflect(ix + k as isize - half, iwidth)];
            }
            *dst = sum;
        }
    });

    // Vertical pass.
    let mut output = ImageF::new(width, height);
    let temp = &temp;
    for_each_chunk_mut(output.data_mut(), width, |y, out| {
        let iy = y as isize;
        let rows: [&[f32]; 5] =
            std::array::from_fn(|k| temp.row(reflect(iy + k as isize - half, iheight)));
        for (x, dst) in out.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for (row, &weight) in rows.iter().zip(PYRAMID_KERNEL.iter()) {
                sum += weight * row[x];
            }
            *dst = sum;
        }
    });

    output
}
