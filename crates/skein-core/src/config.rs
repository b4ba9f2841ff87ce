//! The persisted project configuration (`.yarnrc.yml`).
//!
//! The configuration file owns the list of installed plugins. This module
//! exposes keyed upsert/remove operations over that list; callers never
//! rewrite the file themselves.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Name of the project configuration file.
pub const RC_FILE: &str = ".yarnrc.yml";

/// Directory installed plugin payloads are written to, relative to the
/// project root. Other tooling locates plugins by this exact layout.
pub const PLUGIN_DIR: &str = ".yarn/plugins";

/// File extension of installed plugin payloads.
pub const PLUGIN_EXTENSION: &str = "cjs";

/// One installed-plugin record in the configuration file.
///
/// Records are keyed by `path`: re-adding a record with an existing path
/// replaces it. A missing `checksum` field means integrity checking was
/// intentionally disabled for this entry, not that the checksum is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMeta {
    /// Installed file path, relative to the project root (forward slashes).
    pub path: String,
    /// The specifier string the plugin was imported from.
    pub spec: String,
    /// Content digest of the installed payload, when checksumming is on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// In-memory image of `.yarnrc.yml`.
///
/// Only the `plugins` list is interpreted; every other key in the file is
/// preserved verbatim across a save.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RcFile {
    /// Installed plugin records, in import order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginMeta>,

    /// Unrelated configuration keys, carried through untouched.
    #[serde(flatten)]
    rest: BTreeMap<String, serde_yaml::Value>,
}

/// Keyed access to the persisted plugin list.
///
/// All operations load the file, apply a single-record change, and write the
/// result back atomically (temp file + rename), so a record is either fully
/// visible afterwards or not at all.
#[derive(Debug)]
pub struct Configuration;

impl Configuration {
    /// Loads the configuration of the project rooted at `project_cwd`.
    ///
    /// A missing file is an empty configuration, making the first-ever
    /// import and a re-import structurally identical.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(project_cwd: &Path) -> Result<RcFile> {
        let rc_path = project_cwd.join(RC_FILE);
        if !rc_path.exists() {
            return Ok(RcFile::default());
        }

        let data = fs::read_to_string(&rc_path)?;
        if data.trim().is_empty() {
            return Ok(RcFile::default());
        }
        let rc: RcFile = serde_yaml::from_str(&data)?;
        Ok(rc)
    }

    /// Upserts one plugin record, keyed by its `path`.
    ///
    /// An existing record at the same path is replaced in place; otherwise
    /// the record is appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or persisted.
    pub fn add_plugin(project_cwd: &Path, meta: PluginMeta) -> Result<()> {
        let mut rc = Self::load(project_cwd)?;

        if let Some(existing) = rc.plugins.iter_mut().find(|p| p.path == meta.path) {
            tracing::debug!("Replacing manifest entry: {}", meta.path);
            *existing = meta;
        } else {
            tracing::debug!("Adding manifest entry: {}", meta.path);
            rc.plugins.push(meta);
        }

        Self::save(project_cwd, &rc)
    }

    /// Removes the plugin record at `path`, returning it if it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or persisted.
    pub fn remove_plugin(project_cwd: &Path, path: &str) -> Result<Option<PluginMeta>> {
        let mut rc = Self::load(project_cwd)?;

        let Some(position) = rc.plugins.iter().position(|p| p.path == path) else {
            return Ok(None);
        };
        let removed = rc.plugins.remove(position);
        Self::save(project_cwd, &rc)?;
        Ok(Some(removed))
    }

    /// Writes the configuration back atomically via temp file + rename.
    fn save(project_cwd: &Path, rc: &RcFile) -> Result<()> {
        let rc_path = project_cwd.join(RC_FILE);
        let tmp_path = tmp_path_for(&rc_path);

        let data = serde_yaml::to_string(rc)?;
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &rc_path)?;
        Ok(())
    }
}

fn tmp_path_for(rc_path: &Path) -> PathBuf {
    rc_path.with_extension("yml.tmp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn meta(path: &str, spec: &str) -> PluginMeta {
        PluginMeta {
            path: path.to_string(),
            spec: spec.to_string(),
            checksum: None,
        }
    }

    #[test]
    fn test_load_missing_returns_empty() {
        let temp = TempDir::new().unwrap();
        let rc = Configuration::load(temp.path()).unwrap();
        assert!(rc.plugins.is_empty());
    }

    #[test]
    fn test_add_plugin_appends() {
        let temp = TempDir::new().unwrap();

        Configuration::add_plugin(temp.path(), meta(".yarn/plugins/a.cjs", "a")).unwrap();
        Configuration::add_plugin(temp.path(), meta(".yarn/plugins/b.cjs", "b")).unwrap();

        let rc = Configuration::load(temp.path()).unwrap();
        assert_eq!(rc.plugins.len(), 2);
        assert_eq!(rc.plugins[0].spec, "a");
        assert_eq!(rc.plugins[1].spec, "b");
    }

    #[test]
    fn test_add_plugin_replaces_by_path() {
        let temp = TempDir::new().unwrap();

        Configuration::add_plugin(temp.path(), meta(".yarn/plugins/exec.cjs", "exec")).unwrap();
        let replacement = PluginMeta {
            path: ".yarn/plugins/exec.cjs".to_string(),
            spec: "https://example.com/exec.cjs".to_string(),
            checksum: Some("blake3:00".to_string()),
        };
        Configuration::add_plugin(temp.path(), replacement.clone()).unwrap();

        let rc = Configuration::load(temp.path()).unwrap();
        assert_eq!(rc.plugins.len(), 1);
        assert_eq!(rc.plugins[0], replacement);
    }

    #[test]
    fn test_remove_plugin() {
        let temp = TempDir::new().unwrap();

        Configuration::add_plugin(temp.path(), meta(".yarn/plugins/a.cjs", "a")).unwrap();
        let removed = Configuration::remove_plugin(temp.path(), ".yarn/plugins/a.cjs").unwrap();
        assert_eq!(removed.unwrap().spec, "a");

        let rc = Configuration::load(temp.path()).unwrap();
        assert!(rc.plugins.is_empty());

        let missing = Configuration::remove_plugin(temp.path(), ".yarn/plugins/a.cjs").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_checksum_field_omitted_when_absent() {
        let temp = TempDir::new().unwrap();

        Configuration::add_plugin(temp.path(), meta(".yarn/plugins/a.cjs", "a")).unwrap();
        let raw = std::fs::read_to_string(temp.path().join(RC_FILE)).unwrap();
        assert!(!raw.contains("checksum"));
    }

    #[test]
    fn test_unrelated_keys_preserved() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(RC_FILE),
            "nodeLinker: node-modules\nenableTelemetry: false\n",
        )
        .unwrap();

        Configuration::add_plugin(temp.path(), meta(".yarn/plugins/a.cjs", "a")).unwrap();

        let raw = std::fs::read_to_string(temp.path().join(RC_FILE)).unwrap();
        assert!(raw.contains("nodeLinker: node-modules"));
        assert!(raw.contains("enableTelemetry: false"));
        assert!(raw.contains(".yarn/plugins/a.cjs"));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp = TempDir::new().unwrap();
        Configuration::add_plugin(temp.path(), meta(".yarn/plugins/a.cjs", "a")).unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
