//! End-to-end visual test: capture, persist, compare, report.

use crate::capture::{capture, SessionLauncher};
use crate::{codec, compare, ArtifactPaths, CaptureConfig, CaptureRequest, ComparisonOptions, ComparisonResult, Result};
use log::info;
use serde::Serialize;
use std::fmt;

/// Result of one visual test, tied to the URL it was run against.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub url: String,
    #[serde(flatten)]
    pub result: ComparisonResult,
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}:", self.url)?;
        writeln!(f, "error as px: {}", self.result.mismatched_pixel_count)?;
        write!(f, " error as %: {}%", self.result.error_percentage)
    }
}

/// Capture `request`, write the screenshot to `paths.actual`, compare it with
/// the baseline at `paths.baseline` and write the diff image to `paths.diff`.
pub fn run_test<L: SessionLauncher>(
    launcher: &L,
    request: &CaptureRequest,
    paths: &ArtifactPaths,
    config: &CaptureConfig,
    options: &ComparisonOptions,
) -> Result<TestReport> {
    let actual = capture(launcher, request, config)?;
    codec::write_png(&paths.actual, &actual)?;

    let expected = codec::read_png(&paths.baseline)?;
    let result = compare(&expected, &actual, options)?;
    codec::write_png(&paths.diff, &result.diff_image)?;

    Ok(TestReport {
        url: request.url.clone(),
        result,
    })
}

/// Capture `request` and store it as the baseline at `paths.baseline`.
pub fn create_baseline<L: SessionLauncher>(
    launcher: &L,
    request: &CaptureRequest,
    paths: &ArtifactPaths,
    config: &CaptureConfig,
) -> Result<()> {
    let image = capture(launcher, request, config)?;
    codec::write_png(&paths.baseline, &image)?;
    info!("stored baseline for {} at {}", request.url, paths.baseline.display());
    Ok(())
}
