//! Control plane error types.

use fleet_runtime::RuntimeError;
use thiserror::Error;

/// Result type alias for control plane operations.
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors surfaced by the registry, scale controller, and fault injector.
///
/// None of these is fatal to the hosting process; the API layer turns each
/// into a tagged failure result.
#[derive(Debug, Error)]
pub enum FleetError {
    #[error("Private network missing!")]
    NetworkNotFound,

    #[error("No template found.")]
    NoTemplateAvailable,

    #[error("No nodes left!")]
    PoolEmpty,

    #[error("unknown worker variant: {0}")]
    UnknownVariant(String),

    #[error("invalid scale count {requested} (allowed 1..={max})")]
    InvalidCount { requested: usize, max: usize },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
