//! pagediff
//!
//! Visual regression testing for web pages: render a URL in a headless
//! browser, capture the full page, and compare it against a recorded baseline
//! with a perceptual pixel diff.
//!
//! # Features
//!
//! - **Adaptive capture**: pages are laid out at a seed viewport, measured,
//!   and captured at their full content height in one viewport
//! - **Perceptual diff**: YIQ color distance with anti-aliasing detection
//! - **CDP Backend** (default): Uses Chrome DevTools Protocol via headless Chrome
//!
//! # Example
//!
//! ```no_run
//! use pagediff::{compare, CaptureConfig, CaptureRequest, ComparisonOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let request = CaptureRequest::new("https://example.com");
//! let actual = pagediff::capture(&pagediff::CdpLauncher, &request, &CaptureConfig::default())?;
//! let expected = pagediff::codec::read_png("test/baseline.png".as_ref())?;
//!
//! let result = compare(&expected, &actual, &ComparisonOptions::default())?;
//! println!("error as px: {}", result.mismatched_pixel_count);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod artifacts;
pub mod capture;
pub mod codec;
pub mod diff;
pub mod raster;
pub mod runner;

// Async-friendly capture API (worker-thread backed)
#[cfg(feature = "cdp")]
pub mod async_api;

pub use artifacts::ArtifactPaths;
pub use capture::{capture, capture_with, BrowserSession, SessionLauncher, SEED_HEIGHT};
pub use diff::{compare, compare_files, ComparisonOptions, ComparisonResult};
pub use raster::RasterImage;
pub use runner::TestReport;

#[cfg(feature = "cdp")]
pub use capture::cdp::{CdpLauncher, CdpSession};

/// Viewport width used when a request does not name one
pub const DEFAULT_WIDTH: u32 = 1280;

/// Requested capture height
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Height {
    /// Use the measured content height of the page
    #[default]
    Auto,
    /// Capture exactly this many CSS pixels
    Fixed(u32),
}

impl From<Option<u32>> for Height {
    fn from(h: Option<u32>) -> Self {
        h.map_or(Height::Auto, Height::Fixed)
    }
}

/// What to capture: one URL at one logical width
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    pub url: String,
    pub width: u32,
    pub height: Height,
}

impl CaptureRequest {
    /// Request `url` at the default width with an automatic height
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            width: DEFAULT_WIDTH,
            height: Height::Auto,
        }
    }
}

/// Configuration for browser sessions
///
/// # Examples
///
/// ```
/// let cfg = pagediff::CaptureConfig::default();
/// assert_eq!(cfg.seed_height, pagediff::SEED_HEIGHT);
/// assert_eq!(cfg.timeout_ms, 30000);
/// ```
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Viewport height for the first layout pass
    pub seed_height: u32,
    /// Upper bound on waiting for a navigation to finish, in milliseconds
    pub timeout_ms: u64,
    /// User agent override
    pub user_agent: Option<String>,
    /// Extra command line switches for the browser process
    pub browser_args: Vec<String>,
    /// Run the browser without a window
    pub headless: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            seed_height: SEED_HEIGHT,
            timeout_ms: 30000,
            user_agent: None,
            browser_args: vec!["--disable-infobars".to_string()],
            headless: true,
        }
    }
}
