//! Error types for sandboxed evaluation.
//!
//! Every variant except [`SandboxError::Setup`] is a flavor of the same
//! import-flow failure: the payload is not a usable plugin entry.

use thiserror::Error;

/// Result type for sandbox operations.
pub type Result<T> = std::result::Result<T, SandboxError>;

/// Errors that can occur while evaluating a plugin payload.
#[derive(Error, Debug)]
pub enum SandboxError {
    /// The payload bytes do not compile as a module.
    #[error("plugin entry is not a valid module: {message}")]
    InvalidModule {
        /// Compiler diagnostic
        message: String,
    },

    /// Evaluation trapped, ran out of fuel, or referenced a binding the
    /// sandbox does not expose.
    #[error("plugin evaluation failed: {message}")]
    EvaluationFailed {
        /// Trap or instantiation diagnostic
        message: String,
    },

    /// Evaluation exceeded the wall-clock budget.
    #[error("plugin evaluation timed out after {duration_secs}s")]
    Timeout {
        /// Budget in seconds
        duration_secs: u64,
    },

    /// Evaluation completed without declaring a name.
    #[error("plugin declared no name")]
    MissingName,

    /// The declared name is empty or unsafe to derive a path from.
    #[error("plugin declared an unusable name")]
    InvalidName(#[from] skein_core::Error),

    /// The sandbox engine itself could not be configured.
    #[error("sandbox setup failed: {message}")]
    Setup {
        /// Engine diagnostic
        message: String,
    },
}
