//! perceptualdiff CLI - Perceptual image comparison
//!
//! Compare two images and decide whether they are visibly different.

mod resample;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ColorChoice, Parser};
use colored::Colorize;
use image::RgbaImage;
use log::debug;
use perceptualdiff::{perceptual_diff, CompareResult, Img, ImgVec, PerceptualDiffParams, RGBA8};
use serde::Serialize;

/// Perceptual image comparison for rendering regression tests
///
/// Compares two images using a model of the human visual system and
/// reports whether they look different. Differences that fall below the
/// visibility threshold (noise, dithering, rounding) are ignored.
#[derive(Parser, Debug)]
#[command(name = "perceptualdiff")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Compare two renderings:
        perceptualdiff expected.png actual.png

    Fail on any visible pixel:
        perceptualdiff --threshold 1 expected.png actual.png

    Ignore color, only compare brightness:
        perceptualdiff --luminance-only expected.png actual.png

    Save the difference overlay:
        perceptualdiff --output diff.png expected.png actual.png

    Output JSON for scripting:
        perceptualdiff --json expected.png actual.png

EXIT CODES:
    0 - Images are indistinguishable (or identical)
    1 - Images are visibly different, or their dimensions do not match
    2 - Error (file not found, invalid image, invalid parameter, etc.)")]
struct Cli {
    /// First image
    #[arg(value_name = "IMAGE_A")]
    image_a: PathBuf,

    /// Second image
    #[arg(value_name = "IMAGE_B")]
    image_b: PathBuf,

    /// Field of view in degrees (0.1 to 89.9)
    ///
    /// Horizontal angle the image spans when viewed. Larger values mean
    /// fewer pixels per degree and a less sensitive comparison.
    #[arg(long, default_value = "45.0", value_name = "DEG")]
    fov: f32,

    /// Number of failing pixels at or above which the images differ
    #[arg(long, default_value = "100", value_name = "PIXELS")]
    threshold: usize,

    /// Gamma used to convert RGB into linear space
    #[arg(long, default_value = "2.2", value_name = "G")]
    gamma: f32,

    /// White luminance of the display in cd/m²
    #[arg(long, default_value = "100.0", value_name = "CD_M2")]
    luminance: f32,

    /// Only consider luminance; ignore chroma (color) in the comparison
    #[arg(long, alias = "luminanceonly")]
    luminance_only: bool,

    /// How much of color to use, 0.0 (ignore) to 1.0 (full)
    #[arg(long, alias = "colorfactor", default_value = "1.0", value_name = "FACTOR")]
    color_factor: f32,

    /// How many powers of two to down sample the images
    #[arg(long, default_value = "0", value_name = "N")]
    downsample: u32,

    /// Scale images to match each other's dimensions
    #[arg(long)]
    scale: bool,

    /// Print the sum of the luminance and color differences on failure
    #[arg(long)]
    sum_errors: bool,

    /// Write the difference overlay to FILE (format from extension)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print parameters and passing results, and enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Output JSON
    #[arg(long)]
    json: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Serialize)]
struct JsonOutput {
    passed: bool,
    verdict: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pixels_failed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_sum: Option<f64>,
    image_a: String,
    image_b: String,
    width: u32,
    height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    params: JsonParams,
}

#[derive(Serialize)]
struct JsonParams {
    field_of_view: f32,
    threshold_pixels: usize,
    gamma: f32,
    luminance: f32,
    luminance_only: bool,
    color_factor: f32,
}

/// What the comparison decided, before formatting.
enum Verdict {
    DimensionMismatch,
    Compared(CompareResult),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_colors(&cli);
    setup_logging(&cli);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            // Disable colors if not a terminal
            if !io::stdout().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn setup_logging(cli: &Cli) {
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn params_from_cli(cli: &Cli) -> PerceptualDiffParams {
    PerceptualDiffParams::new()
        .with_field_of_view(cli.fov)
        .with_threshold_pixels(cli.threshold)
        .with_gamma(cli.gamma)
        .with_luminance(cli.luminance)
        .with_luminance_only(cli.luminance_only)
        .with_color_factor(cli.color_factor)
        .with_compute_difference(cli.output.is_some())
}

/// Runs the comparison. `Ok(true)` means the images pass.
fn run(cli: &Cli) -> Result<bool, String> {
    let params = params_from_cli(cli);
    params.validate().map_err(|e| e.to_string())?;

    if cli.verbose && !cli.json {
        print_args(&params);
    }

    let mut img_a = load_image(&cli.image_a)?;
    let mut img_b = load_image(&cli.image_b)?;

    if cli.downsample > 0 {
        let applied = resample::down_sample_pair(&mut img_a, &mut img_b, cli.downsample);
        if cli.verbose && applied > 0 {
            eprintln!("Downsampling by {}", 1u64 << applied);
        }
    }

    if cli.scale {
        if let Some((width, height)) = resample::scale_to_common(&mut img_a, &mut img_b) {
            if cli.verbose {
                eprintln!("Scaling to {width} x {height}");
            }
        }
    }

    let (width, height) = img_a.dimensions();
    let verdict = if img_a.dimensions() == img_b.dimensions() {
        let a = to_imgvec(&img_a);
        let b = to_imgvec(&img_b);
        let result =
            perceptual_diff(a.as_ref(), b.as_ref(), &params).map_err(|e| e.to_string())?;

        if let (Some(path), Some(difference)) = (&cli.output, &result.difference) {
            save_difference(difference, path)?;
            if !cli.json {
                eprintln!("Wrote difference image to {}", path.display());
            }
        }
        Verdict::Compared(result)
    } else {
        debug!(
            "dimension mismatch: {}x{} vs {}x{}",
            img_a.width(),
            img_a.height(),
            img_b.width(),
            img_b.height()
        );
        Verdict::DimensionMismatch
    };

    if cli.json {
        output_json(cli, &params, &verdict, (width, height))?;
    } else {
        output_text(cli, &verdict);
    }

    // Flush stdout
    let _ = io::stdout().flush();

    Ok(match &verdict {
        Verdict::DimensionMismatch => false,
        Verdict::Compared(result) => result.passed(),
    })
}

fn print_args(params: &PerceptualDiffParams) {
    println!("Field of view is {} degrees", params.field_of_view());
    println!("Threshold pixels is {} pixels", params.threshold_pixels());
    println!("The gamma is {}", params.gamma());
    println!(
        "The display's luminance is {} candela per meter squared",
        params.luminance()
    );
}

fn load_image(path: &Path) -> Result<RgbaImage, String> {
    let img =
        image::open(path).map_err(|e| format!("failed to load '{}': {}", path.display(), e))?;
    Ok(img.to_rgba8())
}

fn to_imgvec(img: &RgbaImage) -> ImgVec<RGBA8> {
    let pixels = img
        .pixels()
        .map(|p| {
            let [r, g, b, a] = p.0;
            RGBA8::new(r, g, b, a)
        })
        .collect();
    Img::new(pixels, img.width() as usize, img.height() as usize)
}

fn save_difference(difference: &ImgVec<RGBA8>, path: &Path) -> Result<(), String> {
    let width = difference.width();
    let height = difference.height();

    let mut rgb_data = Vec::with_capacity(width * height * 3);
    for px in difference.pixels() {
        rgb_data.push(px.r);
        rgb_data.push(px.g);
        rgb_data.push(px.b);
    }

    image::save_buffer(
        path,
        &rgb_data,
        width as u32,
        height as u32,
        image::ColorType::Rgb8,
    )
    .map_err(|e| format!("failed to save difference image '{}': {e}", path.display()))
}

/// Report lines in the order they are printed, first line being the verdict.
fn report_lines(cli: &Cli, verdict: &Verdict) -> (bool, Vec<String>) {
    match verdict {
        Verdict::DimensionMismatch => (false, vec!["Image dimensions do not match".to_string()]),
        Verdict::Compared(result) => {
            let mut lines = vec![
                result.outcome.to_string(),
                format!("{} pixels are different", result.pixels_failed),
            ];
            if !result.passed() && cli.sum_errors {
                lines.push(format!("{:.6} error sum", result.error_sum));
            }
            (result.passed(), lines)
        }
    }
}

fn output_text(cli: &Cli, verdict: &Verdict) {
    let (passed, lines) = report_lines(cli, verdict);

    if passed {
        if !cli.verbose {
            return;
        }
        print!("{}: ", "PASS".green().bold());
    } else {
        print!("{}: ", "FAIL".red().bold());
    }
    for line in lines {
        println!("{line}");
    }
}

fn output_json(
    cli: &Cli,
    params: &PerceptualDiffParams,
    verdict: &Verdict,
    (width, height): (u32, u32),
) -> Result<(), String> {
    let (passed, lines) = report_lines(cli, verdict);
    let (pixels_failed, error_sum) = match verdict {
        Verdict::DimensionMismatch => (None, None),
        Verdict::Compared(result) => (Some(result.pixels_failed), Some(result.error_sum)),
    };

    let output = JsonOutput {
        passed,
        verdict: lines.first().cloned().unwrap_or_default(),
        pixels_failed,
        error_sum,
        image_a: cli.image_a.display().to_string(),
        image_b: cli.image_b.display().to_string(),
        width,
        height,
        output: cli.output.as_ref().map(|p| p.display().to_string()),
        params: JsonParams {
            field_of_view: params.field_of_view(),
            threshold_pixels: params.threshold_pixels(),
            gamma: params.gamma(),
            luminance: params.luminance(),
            luminance_only: params.luminance_only(),
            color_factor: params.color_factor(),
        },
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("failed to serialize JSON: {e}"))?;
    println!("{json}");
    Ok(())
}
