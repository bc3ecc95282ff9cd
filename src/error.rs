//! Substrate error types.
//!
//! Invalid arguments fail fast at the call site. Lifecycle errors
//! (closed circuits, closed scopes) are reported, never retried here.

use thiserror::Error;

/// Errors raised while constructing or extending a [`crate::name::Name`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("name path is empty")]
    EmptyPath,
    #[error("name path '{0}' contains an empty segment")]
    EmptySegment(String),
}

/// Errors raised by a [`crate::conduit::Conduit`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConduitError {
    #[error("conduit is closed")]
    Closed,
}

/// Errors raised by [`crate::scope::Scope`] registration.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// The scope was already closed. The offending resource has been
    /// closed immediately so it cannot leak past a completed close().
    #[error("scope is closed")]
    Closed,
}

/// Failure(s) surfaced by `close()`.
///
/// Close is best-effort: one resource failing must not prevent its
/// siblings from closing, so failures are collected and returned together.
#[derive(Debug, Error)]
pub enum CloseError {
    #[error("close failed: {0}")]
    Failed(String),
    #[error("{} resource(s) failed to close", .0.len())]
    Aggregate(Vec<CloseError>),
}

impl CloseError {
    /// Folds a batch of failures into a single error, if any occurred.
    pub fn aggregate(mut failures: Vec<CloseError>) -> Result<(), CloseError> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(CloseError::Aggregate(failures)),
        }
    }
}
