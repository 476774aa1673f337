//! Error types for editor operations.

use thiserror::Error;

/// Result type for editor operations.
pub type CardResult<T> = Result<T, CardError>;

/// Errors that can occur in editor operations.
#[derive(Debug, Error)]
pub enum CardError {
    /// Element not found in the collection.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// A template application is still between its clearing and populating phases.
    #[error("Template {0} is still being applied")]
    TemplateInFlight(String),

    /// No template application is pending completion.
    #[error("No template application in progress")]
    NoTemplatePending,

    /// A canvas size field could not be interpreted.
    #[error("Invalid canvas size: {0}")]
    InvalidCanvasSize(String),

    /// Document serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
