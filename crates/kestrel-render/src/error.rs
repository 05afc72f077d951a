//! Error types for the render crate.

use thiserror::Error;

/// Errors that can occur while building drawing resources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The pixel buffer length does not match the image dimensions.
    #[error("invalid image data: expected {expected} bytes, got {actual}")]
    InvalidImageData { expected: usize, actual: usize },

    /// Invalid image dimensions (zero width or height).
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
