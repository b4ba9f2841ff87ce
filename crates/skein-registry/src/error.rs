//! Error types for specifier resolution.

use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while resolving a plugin specifier to bytes.
///
/// None of these are retried; each one aborts the import that produced it.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A `http:`/`https:`-prefixed specifier is not a well-formed URL.
    #[error("invalid plugin reference: '{spec}'")]
    InvalidPluginReference {
        /// The specifier as typed by the user
        spec: String,
        /// Underlying URL parse failure
        #[source]
        source: url::ParseError,
    },

    /// A registry specifier carried a version that is not a strict semver.
    ///
    /// Official registry entries only accept exact versions; ranges and
    /// tags such as `latest` are rejected.
    #[error("official plugins must be referenced by an exact version, got '{version}' in '{spec}'")]
    OfficialPluginVersionRequired {
        /// The specifier as typed by the user
        spec: String,
        /// The offending version suffix
        version: String,
    },

    /// The requested identity is absent from the registry index.
    #[error("couldn't find plugin '{identity}' in the registry ({})", not_found_hint(.already_installed))]
    PluginNameNotFound {
        /// The canonical identity that was looked up
        identity: String,
        /// Whether a plugin is already installed under this name
        already_installed: bool,
    },

    /// The registry index document could not be fetched.
    #[error("registry index unavailable: {url}")]
    IndexUnavailable {
        /// URL of the index document
        url: String,
        /// Underlying transport failure
        #[source]
        source: reqwest::Error,
    },

    /// The registry index document could not be interpreted.
    #[error("registry index malformed: {reason}")]
    IndexMalformed {
        /// Why the document was rejected
        reason: String,
    },

    /// The resolved source could not be read.
    #[error("couldn't read plugin source '{location}'")]
    SourceUnreadable {
        /// Path or URL that failed
        location: String,
        /// Underlying I/O or HTTP failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Sharpens the not-found message; informational only.
fn not_found_hint(already_installed: &bool) -> &'static str {
    if *already_installed {
        "it is already installed under this name"
    } else {
        "it is not a recognized registry plugin"
    }
}
