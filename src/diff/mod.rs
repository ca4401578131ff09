//! Perceptual pixel diff.
//!
//! [`compare`] classifies every pixel of two equally sized images as a match,
//! a mismatch, or an anti-aliasing artifact, paints a diff image, and reports
//! the mismatch count. Rows are split into bands and classified on scoped
//! worker threads; each band owns its slice of the diff image and only reads
//! the two inputs, so the result does not depend on scheduling.

pub mod antialias;
pub mod color;

use crate::{codec, Error, RasterImage, Result};
use log::{debug, info};
use serde::Serialize;
use std::path::Path;

/// Below this many pixels the comparison runs on the calling thread.
const PARALLEL_MIN_PIXELS: u64 = 64 * 1024;

/// Options for [`compare`].
///
/// # Examples
///
/// ```
/// let opts = pagediff::ComparisonOptions::default();
/// assert_eq!(opts.threshold, 0.1);
/// assert!(!opts.include_anti_aliasing);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonOptions {
    /// Matching threshold in [0, 1]. 0 requires an exact match; larger values
    /// tolerate larger perceptual differences.
    pub threshold: f64,
    /// Count anti-aliased pixels as mismatches instead of ignoring them
    pub include_anti_aliasing: bool,
    /// Color semi-transparent pixels are flattened onto before comparing
    pub blend_background: [u8; 3],
    /// Opacity of the faded baseline drawn under matching pixels in the diff
    /// image. 0 paints matches plain white.
    pub diff_alpha: f64,
    /// Diff color for anti-aliased pixels
    pub aa_color: [u8; 3],
    /// Diff color for mismatched pixels
    pub diff_color: [u8; 3],
    /// Optional color for mismatches where the actual image got darker,
    /// so lightened and darkened regions can be told apart
    pub diff_color_alt: Option<[u8; 3]>,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            include_anti_aliasing: false,
            blend_background: [0, 0, 0],
            diff_alpha: 0.0,
            aa_color: [255, 255, 0],
            diff_color: [255, 0, 0],
            diff_color_alt: None,
        }
    }
}

impl ComparisonOptions {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidOptions(format!(
                "threshold must be within [0, 1], got {}",
                self.threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.diff_alpha) {
            return Err(Error::InvalidOptions(format!(
                "diff_alpha must be within [0, 1], got {}",
                self.diff_alpha
            )));
        }
        Ok(())
    }
}

/// Outcome of one comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub mismatched_pixel_count: u64,
    pub width: u32,
    pub height: u32,
    /// Mismatched share of all pixels, in percent, rounded to two decimals
    pub error_percentage: f64,
    #[serde(skip)]
    pub diff_image: RasterImage,
}

impl ComparisonResult {
    pub fn is_match(&self) -> bool {
        self.mismatched_pixel_count == 0
    }
}

/// `round2(100 * mismatched / total)`; an empty image has no error.
pub fn error_percentage(mismatched: u64, width: u32, height: u32) -> f64 {
    let total = width as u64 * height as u64;
    if total == 0 {
        return 0.0;
    }
    (100.0 * 100.0 * mismatched as f64 / total as f64).round() / 100.0
}

/// Per-comparison constants shared read-only by all workers.
struct Classifier<'a> {
    expected: &'a RasterImage,
    actual: &'a RasterImage,
    opts: &'a ComparisonOptions,
    max_delta: f64,
    exact: bool,
}

impl Classifier<'_> {
    /// Classify rows starting at `first_row`, writing into `band` (whole rows
    /// of the diff image). Returns the number of mismatches.
    fn classify_band(&self, first_row: u32, band: &mut [u8]) -> u64 {
        let width = self.expected.width;
        let row_bytes = width as usize * 4;
        let mut mismatches = 0;

        for (row, out_row) in band.chunks_exact_mut(row_bytes).enumerate() {
            let y = first_row + row as u32;
            for (x, out) in out_row.chunks_exact_mut(4).enumerate() {
                let x = x as u32;
                let rgba = match self.classify(x, y) {
                    Pixel::Match => self.gray(x, y),
                    Pixel::AntiAliased => self.opaque(self.opts.aa_color),
                    Pixel::Mismatch { darker } => {
                        mismatches += 1;
                        match (darker, self.opts.diff_color_alt) {
                            (true, Some(alt)) => self.opaque(alt),
                            _ => self.opaque(self.opts.diff_color),
                        }
                    }
                };
                out.copy_from_slice(&rgba);
            }
        }
        mismatches
    }

    fn classify(&self, x: u32, y: u32) -> Pixel {
        let a = self.expected.pixel(x, y);
        let b = self.actual.pixel(x, y);
        if a == b {
            return Pixel::Match;
        }

        let bg = self.opts.blend_background;
        let delta = color::delta(a, b, bg);
        let darker = delta < 0.0;

        if self.exact {
            return Pixel::Mismatch { darker };
        }
        if delta.abs() <= self.max_delta {
            return Pixel::Match;
        }

        if !self.opts.include_anti_aliasing
            && (antialias::antialiased(self.expected, self.actual, x, y, bg)
                || antialias::antialiased(self.actual, self.expected, x, y, bg))
        {
            return Pixel::AntiAliased;
        }
        Pixel::Mismatch { darker }
    }

    /// Baseline luma faded toward white by `diff_alpha`.
    fn gray(&self, x: u32, y: u32) -> [u8; 4] {
        let [r, g, b, a] = self.expected.pixel(x, y);
        let luma = color::rgb2y(r as f64, g as f64, b as f64);
        let v = color::blend(luma, 255.0, self.opts.diff_alpha * a as f64 / 255.0);
        let v = v.round().clamp(0.0, 255.0) as u8;
        [v, v, v, 255]
    }

    fn opaque(&self, rgb: [u8; 3]) -> [u8; 4] {
        [rgb[0], rgb[1], rgb[2], 255]
    }
}

enum Pixel {
    Match,
    AntiAliased,
    Mismatch { darker: bool },
}

/// Compare `actual` against `expected`.
///
/// Fails with [`Error::DimensionMismatch`] before touching any pixel when the
/// sizes differ.
pub fn compare(expected: &RasterImage, actual: &RasterImage, opts: &ComparisonOptions) -> Result<ComparisonResult> {
    opts.validate()?;
    if expected.dimensions() != actual.dimensions() {
        return Err(Error::DimensionMismatch {
            expected: expected.dimensions(),
            actual: actual.dimensions(),
        });
    }

    let (width, height) = expected.dimensions();
    let mut diff_image = RasterImage::filled(width, height, [255, 255, 255, 255]);
    let total = expected.pixel_count();

    let classifier = Classifier {
        expected,
        actual,
        opts,
        max_delta: color::MAX_DELTA * opts.threshold * opts.threshold,
        exact: opts.threshold == 0.0,
    };

    let mismatched_pixel_count = if total == 0 {
        0
    } else if total < PARALLEL_MIN_PIXELS {
        classifier.classify_band(0, &mut diff_image.pixels)
    } else {
        let workers = num_cpus::get().max(1) as u32;
        let band_rows = height.div_ceil(workers).max(1);
        let band_bytes = band_rows as usize * width as usize * 4;
        debug!("comparing {}x{} in bands of {} rows across {} workers", width, height, band_rows, workers);

        std::thread::scope(|s| {
            let classifier = &classifier;
            let handles: Vec<_> = diff_image
                .pixels
                .chunks_mut(band_bytes)
                .enumerate()
                .map(|(i, band)| s.spawn(move || classifier.classify_band(i as u32 * band_rows, band)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .sum::<u64>()
        })
    };

    let result = ComparisonResult {
        mismatched_pixel_count,
        width,
        height,
        error_percentage: error_percentage(mismatched_pixel_count, width, height),
        diff_image,
    };
    info!(
        "compared {}x{}: {} mismatched pixels ({}%)",
        width, height, result.mismatched_pixel_count, result.error_percentage
    );
    Ok(result)
}

/// Decode two PNG files, compare them and write the diff image as PNG.
///
/// A missing `expected` file surfaces as [`Error::MissingBaseline`].
pub fn compare_files(expected: &Path, actual: &Path, diff: &Path, opts: &ComparisonOptions) -> Result<ComparisonResult> {
    let expected_img = codec::read_png(expected)?;
    let actual_img = match codec::read_png(actual) {
        Err(Error::MissingBaseline(p)) => {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("actual image not found: {}", p.display()),
            )));
        }
        other => other?,
    };
    let result = compare(&expected_img, &actual_img, opts)?;
    codec::write_png(diff, &result.diff_image)?;
    Ok(result)
}
