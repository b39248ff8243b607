//! Error types for appherd.
//!
//! Two families live here:
//!
//! - [`ProcessError`] covers failures local to one managed entry (a launch,
//!   a kill, a grouping construct). These are contained per entry and never
//!   abort operations on sibling entries.
//! - [`Error`] covers startup, configuration and persistence failures that
//!   are surfaced to the caller of the registry or the binary.
//!
//! ```rust
//! use appherd_common::{Error, Result, ResultExt};
//!
//! fn read_list() -> Result<()> {
//!     Err(Error::config("rules_path is empty"))
//! }
//!
//! fn startup() -> Result<()> {
//!     read_list().context("Failed to initialize registry")
//! }
//!
//! assert!(startup().unwrap_err().to_string().contains("initialize registry"));
//! ```

use thiserror::Error;

/// Result type alias for appherd operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for startup, configuration and storage failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid settings or command-line input.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The managed-path store could not be read or written.
    #[error("Path store error: {path} - {reason}")]
    Store { path: String, reason: String },

    /// A supervision operation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// I/O error (wraps std::io::Error).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error with additional context.
    #[error("{message}: {source}")]
    WithContext {
        message: String,
        source: Box<Error>,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a path store error.
    pub fn store(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Adds context to an error.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::WithContext {
            message: message.into(),
            source: Box::new(self),
        }
    }
}

// Convenience methods for Result types
pub trait ResultExt<T> {
    /// Adds context to an error result.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(message))
    }
}

// ==============================================================================
// Supervision Errors
// ==============================================================================

/// Per-entry supervision errors.
///
/// `Clone` so that bulk operations can collect them into a report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// The host refused to create a grouping construct or process handle.
    #[error("Resource exhausted: {reason}")]
    ResourceExhausted { reason: String },

    /// Process creation failed (missing file, permission, malformed command).
    #[error("Launch failed: {path} - {reason}")]
    LaunchFailed { path: String, reason: String },

    /// Operation attempted in an incompatible lifecycle state.
    ///
    /// This is a contract violation; the registry's per-path serialization
    /// should make it unreachable.
    #[error("Invalid state: {id} - expected {expected}, got {actual}")]
    InvalidState {
        id: String,
        expected: String,
        actual: String,
    },

    /// Termination signal could not be delivered.
    #[error("Stop failed: {id} - {reason}")]
    StopFailed { id: String, reason: String },

    /// The host refused to report liveness.
    #[error("Liveness query failed: {id} - {reason}")]
    QueryFailed { id: String, reason: String },

    /// The path is not part of the managed set.
    #[error("Not managed: {path}")]
    NotManaged { path: String },
}

impl ProcessError {
    pub fn resource_exhausted(reason: impl Into<String>) -> Self {
        Self::ResourceExhausted {
            reason: reason.into(),
        }
    }

    pub fn launch_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LaunchFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_state(
        id: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidState {
            id: id.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn stop_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::StopFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn query_failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::QueryFailed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn not_managed(path: impl Into<String>) -> Self {
        Self::NotManaged { path: path.into() }
    }
}

/// Result type for supervision operations.
pub type ProcessResult<T> = std::result::Result<T, ProcessError>;
