//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource loading failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// An image load attempt did not finish in time.
    #[error("Image load timed out: {0}")]
    Timeout(String),

    /// Every candidate path for an image failed.
    #[error("Failed to load image after trying all paths: {0}")]
    ImageUnavailable(String),

    /// Rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// The raster produced no usable data.
    #[error("Generated image is empty. The canvas may not have any visible content.")]
    EmptyRaster,

    /// The raster is implausibly small.
    #[error("Generated image data is too small ({0} bytes). The canvas may be blank.")]
    RasterTooSmall(usize),

    /// The stage could not be serialized or restored.
    #[error("Scene serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Image decoding failed.
    #[error("Image decoding failed: {0}")]
    Decode(#[from] image::ImageError),
}
