use thiserror::Error;

use watchdeck_media_probe::ProbeError;

/// Dispatch failure taxonomy. Every variant is non-fatal and is converted
/// to an `Err{message}` result at the dispatcher boundary.
#[derive(Debug, Error, Clone)]
pub enum DispatchError {
    /// No media element or page control surface could be located.
    #[error("{0}")]
    NotFound(String),

    /// The environment refused an operation (e.g. fullscreen).
    #[error("{0}")]
    InvalidState(String),

    /// The requested name keys into no registered handler.
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// The engine is inactive; reported by the bridge before lookup.
    #[error("Extension is disabled.")]
    Disabled,
}

impl From<ProbeError> for DispatchError {
    fn from(err: ProbeError) -> Self {
        DispatchError::NotFound(err.to_string())
    }
}
