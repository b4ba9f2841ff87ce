//! Plugin management command implementation.
//!
//! `plugin import` is the heart of the tool: one sequential flow from a
//! user-supplied specifier to an installed, recorded plugin. Classification,
//! registry lookup, payload fetch, sandboxed identity extraction, and
//! persistence each either complete or abort the whole import; nothing is
//! retried and no partial manifest record is ever committed.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use serde::Serialize;
use skein_core::cli::{ExitCode, OutputFormat};
use skein_core::{Configuration, PluginIdentity, Project};
use skein_registry::{classify, fetch_payload, PluginIndex, Resolution, ResolvedSource};
use skein_sandbox::{ModuleLoader, SandboxLimits};
use skein_store::{install, installed_path, uninstall, verify_installed, InstallError};
use tracing::{info, warn};

/// Plugin management actions.
#[derive(Subcommand, Debug)]
pub enum PluginAction {
    /// Import a plugin from a path, URL, or registry name.
    ///
    /// The payload is evaluated in an isolated sandbox to discover the name
    /// it declares for itself; the installed file path is derived from that
    /// declared name, never from the specifier.
    ///
    /// # Examples
    ///
    /// ```bash
    /// # From the official registry, pinned to this CLI build
    /// skein plugin import exec
    ///
    /// # An exact released version
    /// skein plugin import exec@3.1.0
    ///
    /// # Directly from a URL or a local build
    /// skein plugin import https://example.com/plugin-exec.cjs
    /// skein plugin import ./bundles/plugin-exec.cjs
    /// ```
    Import {
        /// Plugin specifier: `./path`, `https://...`, or `name[@version]`
        spec: String,

        /// Project directory (defaults to the nearest project root)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Skip recording a payload checksum
        #[arg(long)]
        no_checksum: bool,

        /// Registry index document URL (defaults to the official registry)
        #[arg(long)]
        registry: Option<String>,
    },

    /// List installed plugins.
    List {
        /// Project directory (defaults to the nearest project root)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Re-verify installed payloads against recorded checksums
        #[arg(long)]
        verify: bool,
    },

    /// Remove an installed plugin.
    Remove {
        /// Declared plugin name, or installed path as shown by `list`
        name: String,

        /// Project directory (defaults to the nearest project root)
        #[arg(long)]
        project: Option<PathBuf>,

        /// Skip confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Knobs for one import invocation.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Record a checksum for the installed payload.
    pub checksum: bool,
    /// Version tag of the running CLI, used to pin registry builds.
    pub version_tag: Option<String>,
    /// Registry index document URL override.
    pub index_url: Option<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            checksum: true,
            version_tag: Some(env!("CARGO_PKG_VERSION").to_string()),
            index_url: None,
        }
    }
}

/// Result of importing a plugin.
#[derive(Debug, Serialize)]
pub struct ImportReport {
    /// Identity the plugin declared for itself
    pub name: String,
    /// Installed path, relative to the project root
    pub path: String,
    /// Specifier recorded in the manifest
    pub spec: String,
    /// Recorded payload checksum, when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Where the payload bytes came from
    pub source: String,
}

/// Result of listing plugins.
#[derive(Debug, Serialize)]
struct ListReport {
    /// Project root the listing is for
    project: String,
    /// Number of installed plugins
    plugin_count: usize,
    /// Installed plugin records
    plugins: Vec<PluginRow>,
}

/// One installed plugin in a listing.
#[derive(Debug, Serialize)]
struct PluginRow {
    /// Installed path, relative to the project root
    path: String,
    /// Specifier the plugin was imported from
    spec: String,
    /// Recorded payload checksum, when enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    checksum: Option<String>,
    /// Verification outcome, when `--verify` was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
}

/// Result of removing a plugin.
#[derive(Debug, Serialize)]
struct RemoveReport {
    /// Removed manifest path
    path: String,
    /// Whether a record was actually removed
    removed: bool,
}

/// Runs a plugin management action.
///
/// # Errors
///
/// Returns an error if the underlying plugin operation fails.
pub async fn run(action: PluginAction, output_format: OutputFormat) -> Result<ExitCode> {
    match action {
        PluginAction::Import {
            spec,
            project,
            no_checksum,
            registry,
        } => {
            let project = locate_project(project.as_deref())?;
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            let options = ImportOptions {
                checksum: !no_checksum,
                index_url: registry,
                ..ImportOptions::default()
            };

            let report = import_plugin(&project, &cwd, &spec, &options).await?;
            let formatted = crate::formatters::format_output(&report, output_format)?;
            println!("{formatted}");
            Ok(ExitCode::SUCCESS)
        }
        PluginAction::List { project, verify } => {
            let project = locate_project(project.as_deref())?;
            list_plugins(&project, verify, output_format)
        }
        PluginAction::Remove { name, project, yes } => {
            let project = locate_project(project.as_deref())?;
            remove_plugin(&project, &name, yes, output_format)
        }
    }
}

/// Resolves the target project from an explicit directory or by discovery.
fn locate_project(explicit: Option<&Path>) -> Result<Project> {
    match explicit {
        Some(dir) => Ok(Project::open(dir)),
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            Project::find(&cwd).context("run inside a project, or pass --project")
        }
    }
}

/// Imports one plugin: resolve, fetch, evaluate, install.
///
/// The flow is strictly sequential; each step either completes or fails the
/// whole import. Relative path specifiers resolve against `cwd`, which is
/// the invocation directory rather than the project root.
///
/// # Errors
///
/// Surfaces classification, registry, fetch, sandbox, and persistence
/// failures from the underlying crates, each reported once.
pub async fn import_plugin(
    project: &Project,
    cwd: &Path,
    raw_spec: &str,
    options: &ImportOptions,
) -> Result<ImportReport> {
    info!("Importing plugin: {}", raw_spec);
    let client = reqwest::Client::new();
    let version_tag = options.version_tag.as_deref();

    let (source, recorded_spec) = match classify(raw_spec, cwd)? {
        Resolution::Source(source) => (source, raw_spec.to_string()),
        Resolution::Registry(request) => {
            let index = match &options.index_url {
                Some(url) => PluginIndex::fetch_from(&client, url).await?,
                None => PluginIndex::fetch(&client, version_tag).await?,
            };

            let installed: Vec<String> = Configuration::load(project.cwd())
                .context("failed to read project configuration")?
                .plugins
                .into_iter()
                .map(|p| p.spec)
                .collect();

            let url = index.resolve(&request, version_tag, &installed)?;

            // Registry specs are recorded in canonical form, pinned when an
            // exact version was requested.
            let recorded = match &request.version {
                Some(version) => format!("{}@{version}", request.identity),
                None => request.identity.clone(),
            };
            (ResolvedSource::RemoteUrl(url), recorded)
        }
    };

    let payload = fetch_payload(&source, &client).await?;

    let loader = ModuleLoader::new(SandboxLimits::default())?;
    let identity = loader
        .load(&payload)
        .await
        .context("imported payload is not a valid plugin entry")?;

    let meta = install(project, &identity, &payload, &recorded_spec, options.checksum)
        .with_context(|| format!("failed to install plugin '{identity}'"))?;

    info!("Imported plugin {} -> {}", identity, meta.path);

    Ok(ImportReport {
        name: identity.to_string(),
        path: meta.path,
        spec: meta.spec,
        checksum: meta.checksum,
        source: source.location(),
    })
}

/// Lists installed plugins, optionally re-verifying their payloads.
fn list_plugins(project: &Project, verify: bool, output_format: OutputFormat) -> Result<ExitCode> {
    let rc = Configuration::load(project.cwd()).context("failed to read project configuration")?;

    if rc.plugins.is_empty() {
        warn!("No plugins installed in {}", project.cwd().display());
    }

    let mut all_ok = true;
    let plugins: Vec<PluginRow> = rc
        .plugins
        .iter()
        .map(|meta| {
            let status = verify.then(|| match verify_installed(project, meta) {
                Ok(()) if meta.checksum.is_some() => "ok".to_string(),
                Ok(()) => "unchecked".to_string(),
                Err(InstallError::MissingFile { .. }) => {
                    all_ok = false;
                    "missing".to_string()
                }
                Err(InstallError::ChecksumMismatch { .. }) => {
                    all_ok = false;
                    "mismatch".to_string()
                }
                Err(e) => {
                    all_ok = false;
                    format!("error: {e}")
                }
            });

            PluginRow {
                path: meta.path.clone(),
                spec: meta.spec.clone(),
                checksum: meta.checksum.clone(),
                status,
            }
        })
        .collect();

    let report = ListReport {
        project: project.cwd().display().to_string(),
        plugin_count: plugins.len(),
        plugins,
    };

    let formatted = crate::formatters::format_output(&report, output_format)?;
    println!("{formatted}");

    if all_ok {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Removes an installed plugin by declared name or manifest path.
fn remove_plugin(
    project: &Project,
    name: &str,
    yes: bool,
    output_format: OutputFormat,
) -> Result<ExitCode> {
    // Accept either the path as listed or a declared name to derive it from.
    let path = match PluginIdentity::new(name) {
        Ok(identity) if !name.contains(".cjs") => installed_path(&identity),
        _ => name.to_string(),
    };

    if !yes {
        use dialoguer::Confirm;

        let confirmed = Confirm::new()
            .with_prompt(format!("Remove plugin '{path}'?"))
            .default(false)
            .interact()
            .context("failed to read confirmation")?;

        if !confirmed {
            info!("Plugin removal cancelled by user");
            return Ok(ExitCode::SUCCESS);
        }
    }

    let removed = uninstall(project, &path)
        .with_context(|| format!("failed to remove plugin '{path}'"))?
        .is_some();

    if !removed {
        warn!("No plugin installed at {}", path);
    }

    let report = RemoveReport { path, removed };
    let formatted = crate::formatters::format_output(&report, output_format)?;
    println!("{formatted}");

    Ok(if removed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
