//! Error types for plugin request building.

use thiserror::Error;

/// Result type alias for request building.
pub type RequestResult<T> = Result<T, RequestError>;

#[derive(Debug, Error)]
pub enum RequestError {
    /// The plugin manifest is known to be invalid; no requests may be built.
    #[error("dependency conflict: plugin manifest is unhealthy")]
    DependencyConflict,
}
