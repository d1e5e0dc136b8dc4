use perceptualdiff::{perceptual_diff, Img, PerceptualDiffParams, RGBA8};
use std::time::Instant;

fn main() {
    let width = 512;
    let height = 512;

    // Create gradient images with small differences
    let mut pixels1 = Vec::with_capacity(width * height);
    let mut pixels2 = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let val = ((x as f32 / width as f32) * 200.0) as u8;
            pixels1.push(RGBA8::new(val, val, val, 255));

            let val2 = val.saturating_add(((x * y) % 10) as u8);
            pixels2.push(RGBA8::new(val2, val2, val2, 255));
        }
    }

    let img1 = Img::new(pixels1, width, height);
    let img2 = Img::new(pixels2, width, height);

    for (label, params) in [
        ("full", PerceptualDiffParams::default()),
        (
            "luminance only",
            PerceptualDiffParams::default().with_luminance_only(true),
        ),
        (
            "with overlay",
            PerceptualDiffParams::default().with_compute_difference(true),
        ),
    ] {
        // Warmup
        let result = perceptual_diff(img1.as_ref(), img2.as_ref(), &params)
            .expect("images have equal dimensions");

        let iterations = 10;
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = perceptual_diff(img1.as_ref(), img2.as_ref(), &params);
        }
        let elapsed = start.elapsed();

        println!(
            "512x512 {label}: {:.2}ms per iteration ({} iterations, total {:.2}s), {} pixels failed",
            elapsed.as_secs_f64() * 1000.0 / iterations as f64,
            iterations,
            elapsed.as_secs_f64(),
            result.pixels_failed
        );
    }
}
