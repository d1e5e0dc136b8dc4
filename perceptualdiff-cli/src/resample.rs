//! Bicubic resampling used by `--downsample` and `--scale`.

use image::imageops::{self, FilterType};
use image::RgbaImage;

/// Resizes `img` to `width`×`height`, or halves it when a target is `None`.
///
/// Returns `None` when the image is already 1 pixel wide or tall, or when the
/// target equals the current size.
pub fn down_sample(
    img: &RgbaImage,
    width: Option<u32>,
    height: Option<u32>,
) -> Option<RgbaImage> {
    let (w, h) = img.dimensions();
    if w <= 1 || h <= 1 {
        return None;
    }

    let target_w = width.unwrap_or(w / 2);
    let target_h = height.unwrap_or(h / 2);
    if (target_w, target_h) == (w, h) {
        return None;
    }

    Some(imageops::resize(img, target_w, target_h, FilterType::CatmullRom))
}

/// Halves both images up to `times` times, stopping as soon as either one can
/// no longer shrink. Returns how many halvings were applied.
pub fn down_sample_pair(a: &mut RgbaImage, b: &mut RgbaImage, times: u32) -> u32 {
    for i in 0..times {
        match (down_sample(a, None, None), down_sample(b, None, None)) {
            (Some(next_a), Some(next_b)) => {
                *a = next_a;
                *b = next_b;
            }
            _ => return i,
        }
    }
    times
}

/// Resizes both images to the smaller width and the smaller height of the
/// two. Returns the common size, or `None` if they already match.
pub fn scale_to_common(a: &mut RgbaImage, b: &mut RgbaImage) -> Option<(u32, u32)> {
    if a.dimensions() == b.dimensions() {
        return None;
    }

    let width = a.width().min(b.width());
    let height = a.height().min(b.height());
    if let Some(scaled) = down_sample(a, Some(width), Some(height)) {
        *a = scaled;
    }
    if let Some(scaled) = down_sample(b, Some(width), Some(height)) {
        *b = scaled;
    }
    Some((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([90, 120, 200, 255]))
    }

    #[test]
    fn test_down_sample_halves() {
        let out = down_sample(&solid(10, 7), None, None).unwrap();
        assert_eq!(out.dimensions(), (5, 3));
        // A flat field stays flat under Catmull-Rom.
        assert!(out.pixels().all(|p| p.0 == [90, 120, 200, 255]));
    }

    #[test]
    fn test_down_sample_refuses_thin_or_same_size() {
        assert!(down_sample(&solid(1, 8), None, None).is_none());
        assert!(down_sample(&solid(8, 1), None, None).is_none());
        assert!(down_sample(&solid(6, 4), Some(6), Some(4)).is_none());
    }

    #[test]
    fn test_down_sample_pair_stops_early() {
        let mut a = solid(8, 8);
        let mut b = solid(8, 8);
        let applied = down_sample_pair(&mut a, &mut b, 10);
        assert_eq!(applied, 3);
        assert_eq!(a.dimensions(), (1, 1));
        assert_eq!(b.dimensions(), (1, 1));
    }

    #[test]
    fn test_scale_to_common() {
        let mut a = solid(12, 5);
        let mut b = solid(9, 8);
        assert_eq!(scale_to_common(&mut a, &mut b), Some((9, 5)));
        assert_eq!(a.dimensions(), (9, 5));
        assert_eq!(b.dimensions(), (9, 5));

        assert_eq!(scale_to_common(&mut a, &mut b), None);
    }
}
