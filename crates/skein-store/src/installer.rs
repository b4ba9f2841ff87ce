//! The installation step of the import pipeline.

use std::fs;
use std::path::Path;

use skein_core::{Configuration, PluginIdentity, PluginMeta, Project, PLUGIN_DIR, PLUGIN_EXTENSION};

use crate::checksum::{calculate_checksum, verify_checksum};
use crate::error::{InstallError, Result};

/// Derives the installed file path for a declared identity, relative to the
/// project root. Always forward slashes, regardless of platform.
#[must_use]
pub fn installed_path(identity: &PluginIdentity) -> String {
    format!("{PLUGIN_DIR}/{identity}.{PLUGIN_EXTENSION}")
}

/// Installs a plugin payload under its declared identity.
///
/// Writes the payload to `.yarn/plugins/<identity>.cjs` (creating parent
/// directories as needed, overwriting any previous content) and upserts the
/// manifest record for that path into the project configuration. Because
/// both the file write and the record are keyed by the declared identity,
/// importing the same plugin twice replaces rather than accumulates.
///
/// The manifest upsert itself is atomic; the window between the file write
/// and the upsert is not. An interruption there leaves an installed file
/// with no record, which is harmless: the file is never consulted without
/// its record, and re-running the import overwrites it.
///
/// # Errors
///
/// Propagates filesystem errors from the payload write and persistence
/// errors from the configuration store.
pub fn install(
    project: &Project,
    identity: &PluginIdentity,
    payload: &[u8],
    spec: &str,
    checksum_enabled: bool,
) -> Result<PluginMeta> {
    let relative_path = installed_path(identity);
    let absolute_path = project.cwd().join(&relative_path);

    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&absolute_path, payload)?;
    tracing::debug!("Wrote plugin payload: {} ({} bytes)", relative_path, payload.len());

    let checksum = checksum_enabled.then(|| calculate_checksum(payload));

    let meta = PluginMeta {
        path: relative_path,
        spec: spec.to_string(),
        checksum,
    };
    Configuration::add_plugin(project.cwd(), meta.clone())?;

    tracing::info!("Installed plugin {} from '{}'", identity, spec);
    Ok(meta)
}

/// Removes an installed plugin by its manifest path.
///
/// The manifest record is removed first, then the payload file; an
/// interruption in between leaves only the harmless file-without-record
/// state. Returns the removed record, or `None` if no record existed.
///
/// # Errors
///
/// Propagates persistence and filesystem errors.
pub fn uninstall(project: &Project, path: &str) -> Result<Option<PluginMeta>> {
    let Some(removed) = Configuration::remove_plugin(project.cwd(), path)? else {
        return Ok(None);
    };

    let absolute_path = project.cwd().join(path);
    match fs::remove_file(&absolute_path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Removed plugin: {}", path);
    Ok(Some(removed))
}

/// Checks an installed plugin against its manifest record.
///
/// Records without a checksum opted out of integrity checking and always
/// verify; the payload file must still exist.
///
/// # Errors
///
/// - [`InstallError::MissingFile`] if the payload file is gone
/// - [`InstallError::ChecksumMismatch`] if the content hash differs
pub fn verify_installed(project: &Project, meta: &PluginMeta) -> Result<()> {
    let absolute_path = project.cwd().join(&meta.path);

    let payload = match fs::read(&absolute_path) {
        Ok(payload) => payload,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(InstallError::MissingFile {
                path: Path::new(&meta.path).to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    match &meta.checksum {
        Some(expected) => verify_checksum(&payload, expected, &meta.path),
        None => Ok(()),
    }
}
