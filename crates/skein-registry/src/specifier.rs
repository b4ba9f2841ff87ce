//! Plugin specifier classification.
//!
//! A specifier is one of:
//! - a filesystem path (`./x`, `../x`, `/abs/x`)
//! - a `http:`/`https:` URL
//! - a registry short name (`exec`, `plugin-exec`, `@yarnpkg/plugin-exec`),
//!   optionally suffixed with `@<exact version>`
//!
//! Classification is pure string work; existence checks and network access
//! happen later in the pipeline.

use std::path::{Path, PathBuf};

use semver::Version;
use url::Url;

use crate::error::{RegistryError, Result};
use crate::index::DEFAULT_SCOPE;

/// Prefix conventionally carried by registry plugin package names.
const NAME_PREFIX: &str = "plugin-";

/// A specifier resolved to a concrete byte source.
///
/// Exactly one variant per resolution; the fetch stage matches exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource {
    /// A file on the local filesystem, resolved against the invocation cwd.
    LocalPath(PathBuf),
    /// A remote payload fetched over HTTP(S).
    RemoteUrl(Url),
}

impl ResolvedSource {
    /// Human-readable location, for diagnostics.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::LocalPath(path) => path.display().to_string(),
            Self::RemoteUrl(url) => url.to_string(),
        }
    }
}

/// A short-name specifier awaiting a registry index lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRequest {
    /// Canonical identity in the form `@yarnpkg/plugin-<name>`.
    pub identity: String,
    /// Exact version to pin, when the specifier carried one.
    pub version: Option<Version>,
}

/// Outcome of classifying a raw specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The specifier denotes a source directly; no registry involved.
    Source(ResolvedSource),
    /// The specifier is a registry short name to look up in the index.
    Registry(RegistryRequest),
}

/// Classifies a raw user specifier.
///
/// Relative paths are resolved against `cwd`. Performs no I/O.
///
/// # Errors
///
/// - [`RegistryError::InvalidPluginReference`] if a URL-shaped specifier
///   does not parse
/// - [`RegistryError::OfficialPluginVersionRequired`] if a short name
///   carries a non-semver version suffix
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use skein_registry::{classify, Resolution};
///
/// let cwd = Path::new("/work");
/// match classify("exec", cwd).unwrap() {
///     Resolution::Registry(request) => {
///         assert_eq!(request.identity, "@yarnpkg/plugin-exec");
///         assert!(request.version.is_none());
///     }
///     Resolution::Source(_) => unreachable!(),
/// }
/// ```
pub fn classify(raw: &str, cwd: &Path) -> Result<Resolution> {
    if is_path_specifier(raw) {
        let path = cwd.join(raw);
        tracing::debug!("Classified '{}' as local path: {}", raw, path.display());
        return Ok(Resolution::Source(ResolvedSource::LocalPath(path)));
    }

    if raw.starts_with("http:") || raw.starts_with("https:") {
        let url = Url::parse(raw).map_err(|source| RegistryError::InvalidPluginReference {
            spec: raw.to_string(),
            source,
        })?;
        tracing::debug!("Classified '{}' as remote URL", raw);
        return Ok(Resolution::Source(ResolvedSource::RemoteUrl(url)));
    }

    let (name, version) = split_version(raw)?;
    let identity = canonical_identity(name);
    tracing::debug!("Classified '{}' as registry name: {}", raw, identity);
    Ok(Resolution::Registry(RegistryRequest { identity, version }))
}

/// Path specifiers are recognized purely by prefix, never by probing disk.
fn is_path_specifier(raw: &str) -> bool {
    raw == "."
        || raw == ".."
        || raw.starts_with("./")
        || raw.starts_with("../")
        || raw.starts_with('/')
        || Path::new(raw).is_absolute()
}

/// Splits an optional `@<version>` suffix off a short name.
///
/// A leading `@` belongs to the scope, not a version; only a later `@`
/// separates the version suffix.
fn split_version(raw: &str) -> Result<(&str, Option<Version>)> {
    let Some(at) = raw
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '@')
        .map(|(i, _)| i)
    else {
        return Ok((raw, None));
    };

    let (name, suffix) = (&raw[..at], &raw[at + 1..]);
    match Version::parse(suffix) {
        Ok(version) => Ok((name, Some(version))),
        Err(_) => Err(RegistryError::OfficialPluginVersionRequired {
            spec: raw.to_string(),
            version: suffix.to_string(),
        }),
    }
}

/// Re-normalizes a short name to `@yarnpkg/plugin-<name>`.
fn canonical_identity(name: &str) -> String {
    let name = match name.strip_prefix('@') {
        Some(rest) => rest.split_once('/').map_or(name, |(_, tail)| tail),
        None => name,
    };
    let name = name.strip_prefix(NAME_PREFIX).unwrap_or(name);
    format!("{DEFAULT_SCOPE}/{NAME_PREFIX}{name}")
}
