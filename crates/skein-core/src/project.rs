//! Project root discovery.

use std::path::{Path, PathBuf};

use crate::config::RC_FILE;
use crate::error::{Error, Result};

/// Marker files that identify a project root.
const PROJECT_MARKERS: &[&str] = &[RC_FILE, "package.json"];

/// A located project.
///
/// Wraps the absolute project root directory that installed plugin paths and
/// the configuration file are resolved against.
///
/// # Examples
///
/// ```no_run
/// use skein_core::Project;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let project = Project::find(std::env::current_dir()?.as_path())?;
/// println!("project root: {}", project.cwd().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Project {
    cwd: PathBuf,
}

impl Project {
    /// Opens a project at a known root without searching for markers.
    #[must_use]
    pub fn open(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }

    /// Walks up from `start` until a directory containing a project marker
    /// (`.yarnrc.yml` or `package.json`) is found.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] when no ancestor carries a marker.
    pub fn find(start: &Path) -> Result<Self> {
        for dir in start.ancestors() {
            if PROJECT_MARKERS.iter().any(|m| dir.join(m).is_file()) {
                tracing::debug!("Found project root: {}", dir.display());
                return Ok(Self::open(dir));
            }
        }

        Err(Error::ProjectNotFound {
            start: start.to_path_buf(),
        })
    }

    /// Returns the absolute project root directory.
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Returns the path of the project configuration file.
    #[must_use]
    pub fn rc_path(&self) -> PathBuf {
        self.cwd.join(RC_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_find_at_root() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "{}").unwrap();

        let project = Project::find(temp.path()).unwrap();
        assert_eq!(project.cwd(), temp.path());
    }

    #[test]
    fn test_find_walks_up() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(RC_FILE), "").unwrap();
        let nested = temp.path().join("packages/app/src");
        std::fs::create_dir_all(&nested).unwrap();

        let project = Project::find(&nested).unwrap();
        assert_eq!(project.cwd(), temp.path());
    }

    #[test]
    fn test_find_prefers_nearest_marker() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), "{}").unwrap();
        let nested = temp.path().join("workspace");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("package.json"), "{}").unwrap();

        let project = Project::find(&nested).unwrap();
        assert_eq!(project.cwd(), nested);
    }

    #[test]
    fn test_find_missing() {
        let temp = TempDir::new().unwrap();
        let result = Project::find(temp.path());
        assert!(matches!(result, Err(Error::ProjectNotFound { .. })));
    }

    #[test]
    fn test_rc_path() {
        let project = Project::open("/work/app");
        assert_eq!(project.rc_path(), PathBuf::from("/work/app/.yarnrc.yml"));
    }
}
