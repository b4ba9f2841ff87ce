//! Error types shared across the skein workspace.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the core crate.
#[derive(Error, Debug)]
pub enum Error {
    /// An argument failed validation at a construction boundary.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A declared plugin name cannot be used to derive an installation path.
    ///
    /// Names containing parent-directory references, absolute segments, or
    /// control characters are rejected before any path is derived from them.
    #[error("invalid plugin identity '{name}': {reason}")]
    InvalidIdentity {
        /// The offending declared name
        name: String,
        /// Why the name was rejected
        reason: String,
    },

    /// No project root was found above the starting directory.
    ///
    /// A project root is a directory containing `.yarnrc.yml` or
    /// `package.json`.
    #[error("no project found above {}", start.display())]
    ProjectNotFound {
        /// Directory the search started from
        start: PathBuf,
    },

    /// I/O error during configuration access.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `.yarnrc.yml` could not be parsed or serialized.
    #[error("configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_identity_display() {
        let error = Error::InvalidIdentity {
            name: "../escape".to_string(),
            reason: "contains a parent-directory component".to_string(),
        };

        let display = format!("{error}");
        assert!(display.contains("../escape"));
        assert!(display.contains("parent-directory"));
    }

    #[test]
    fn test_project_not_found_display() {
        let error = Error::ProjectNotFound {
            start: PathBuf::from("/tmp/nowhere"),
        };

        let display = format!("{error}");
        assert!(display.contains("no project found"));
        assert!(display.contains("/tmp/nowhere"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();

        let display = format!("{error}");
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as _;

        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error: Error = io_error.into();
        assert!(error.source().is_some());
    }
}
