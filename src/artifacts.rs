//! File naming for baseline, actual and diff images.

use std::path::{Path, PathBuf};

/// Directory artifacts go to when none is given
pub const DEFAULT_DIR: &str = "test";

/// The three images that belong to one URL.
///
/// All names derive from the URL-encoded target, so the same URL always maps
/// to the same files:
/// `<dir>/<encoded>.png`, `<dir>/<encoded>-output.png`, `<dir>/<encoded>-diff.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub baseline: PathBuf,
    pub actual: PathBuf,
    pub diff: PathBuf,
}

impl ArtifactPaths {
    pub fn for_url(dir: impl AsRef<Path>, url: &str) -> Self {
        let dir = dir.as_ref();
        let stem = urlencoding::encode(url);
        Self {
            baseline: dir.join(format!("{}.png", stem)),
            actual: dir.join(format!("{}-output.png", stem)),
            diff: dir.join(format!("{}-diff.png", stem)),
        }
    }

    /// Keep the derived output names but read the baseline from `baseline`.
    pub fn with_baseline(mut self, baseline: impl Into<PathBuf>) -> Self {
        self.baseline = baseline.into();
        self
    }
}
