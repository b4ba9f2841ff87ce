//! Error types for plugin installation.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for installation operations.
pub type Result<T> = std::result::Result<T, InstallError>;

/// Errors that can occur while installing or verifying a plugin.
#[derive(Error, Debug)]
pub enum InstallError {
    /// An installed payload no longer matches its recorded checksum.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Path of the file with mismatched checksum
        path: String,
        /// Expected checksum from the manifest record
        expected: String,
        /// Actual checksum calculated from the file
        actual: String,
    },

    /// A manifest record points at a file that is gone.
    #[error("installed plugin file missing: {}", path.display())]
    MissingFile {
        /// Path of the missing payload, relative to the project root
        path: PathBuf,
    },

    /// I/O error while writing or reading the payload.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The manifest record could not be persisted.
    #[error(transparent)]
    Config(#[from] skein_core::Error),
}
