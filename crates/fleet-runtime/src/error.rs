//! Runtime adapter error types.

use thiserror::Error;

/// Result type alias for runtime adapter calls.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors raised by a container runtime call.
///
/// Messages from the underlying engine are carried verbatim.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("cannot reach container runtime: {0}")]
    Connect(String),

    #[error("runtime transport error: {0}")]
    Transport(String),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("malformed runtime response: {0}")]
    Decode(String),

    #[error("no such unit: {0}")]
    UnitNotFound(String),

    #[error("no such network: {0}")]
    NetworkNotFound(String),

    #[error("{0}")]
    Rejected(String),
}
