//! Studio error types.

use card_core::CardError;
use card_renderer::RenderError;
use thiserror::Error;

/// Result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors raised by the editor session, pipeline and API client.
#[derive(Debug, Error)]
pub enum StudioError {
    /// The configured API base URL is invalid.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    /// HTTP layer failed (connection, timeout, etc.).
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// JSON encoding or decoding failed.
    #[error("failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem access failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Editor state rejected an operation.
    #[error(transparent)]
    Card(#[from] CardError),

    /// Rendering or rasterization failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// An update was requested without an existing design to update.
    #[error("No initial design ID to update.")]
    NoInitialDesign,
}
