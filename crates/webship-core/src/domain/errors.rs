//! Domain error types
//!
//! A deployment run fails in exactly one of three ways: a precondition was
//! not met before any network I/O happened, a transport operation failed
//! mid-run, or the operator cancelled. Adapters report failures as
//! `anyhow::Error` at the port boundary; the mirror engine translates them
//! into these kinds at its single translation boundary.

use thiserror::Error;

/// Errors that can end a deployment run
#[derive(Debug, Error)]
pub enum DeployError {
    /// A requirement that must hold before any network I/O (missing local
    /// directory, unconfigured host, invalid configuration)
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A transport operation (connect, list, mkdir, upload, delete) failed.
    /// The message carries the underlying cause text.
    #[error("{operation} failed: {message}")]
    Transport {
        /// The operation that failed, e.g. `"connect"` or `"delete remote file"`
        operation: String,
        /// Human-readable cause, including the wrapped transport error
        message: String,
    },

    /// The run was interrupted by an external cancellation signal.
    /// Distinct from [`DeployError::Transport`] so callers can treat an
    /// operator-initiated stop differently from a genuine failure.
    #[error("operation cancelled")]
    Cancelled,
}

impl DeployError {
    /// Wraps an adapter error into the transport kind, preserving the full
    /// cause chain in the message.
    pub fn transport(operation: impl Into<String>, err: anyhow::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            message: format!("{err:#}"),
        }
    }

    /// Returns true for the cancellation kind.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
