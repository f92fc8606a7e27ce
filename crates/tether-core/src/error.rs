use thiserror::Error;

/// Errors produced while discovering, creating or tracking an overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// No window matched the target reference.
    #[error("target window not found")]
    TargetNotFound,

    /// The platform refused to enumerate processes.
    #[error("process enumeration failed: {0}")]
    EnumerationFailed(String),

    /// The process table did not fit; `required` is the size the
    /// platform reported for the next attempt.
    #[error("process table buffer too small ({required} bytes required)")]
    BufferTooSmall { required: usize },

    /// The resolved target stopped denoting a live window.
    #[error("target window is gone")]
    TargetLost,

    /// The native window could not be created.
    #[error("window creation failed: {0}")]
    CreationFailed(String),

    /// The render surface for a window could not be created.
    #[error("surface creation failed: {0}")]
    SurfaceCreationFailed(String),

    /// A finished frame could not be copied to the window.
    #[error("frame present failed: {0}")]
    PresentFailed(String),

    /// The builder rejected the configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result alias used across the overlay crates.
pub type OverlayResult<T> = Result<T, OverlayError>;
