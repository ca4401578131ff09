//! Error types for capture and comparison

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pagediff operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing or comparing pages
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to launch the browser or open a page session
    #[error("Browser initialization failed: {0}")]
    InitializationError(String),

    /// Navigation did not complete (network error, bad URL, timeout)
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    /// The session failed after navigation (viewport, measurement or screenshot)
    #[error("Capture failed: {0}")]
    CaptureFailed(String),

    /// The two images handed to the diff engine have different sizes
    #[error("Image dimensions differ: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// No baseline image exists at the given path
    #[error("Baseline image not found: {}", .0.display())]
    MissingBaseline(PathBuf),

    /// Malformed or unsupported image bytes
    #[error("Image codec failure: {0}")]
    CodecFailure(String),

    /// Comparison or capture options out of range
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Filesystem error while reading or writing artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<png::DecodingError> for Error {
    fn from(err: png::DecodingError) -> Self {
        Error::CodecFailure(err.to_string())
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::CodecFailure(err.to_string())
    }
}
