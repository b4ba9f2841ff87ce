//! Skein - plugin manager for Yarn-style projects.
//!
//! # Architecture
//!
//! The CLI is organized around subcommands:
//! - `plugin import` - Resolve a specifier, evaluate the payload in an
//!   isolated sandbox, and install it under its declared identity
//! - `plugin list` - Show installed plugin records, optionally re-verifying
//!   payload checksums
//! - `plugin remove` - Delete an installed plugin and its record
//! - `completions` - Generate shell completions
//!
//! # Examples
//!
//! ```bash
//! # Import the exec plugin from the official registry
//! skein plugin import exec
//!
//! # Import a local build without recording a checksum
//! skein plugin import ./bundles/plugin-exec.cjs --no-checksum
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use skein_cli::commands;
use skein_cli::commands::plugin::PluginAction;
use skein_core::cli::{ExitCode, OutputFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Skein - acquire and install project plugins safely.
///
/// Plugins are fetched from the official registry, a URL, or a local path,
/// evaluated in an isolated sandbox to discover their declared identity,
/// and recorded in the project configuration.
#[derive(Parser, Debug)]
#[command(name = "skein")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (json, text, pretty)
    #[arg(long = "format", global = true, default_value = "pretty")]
    format: String,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage project plugins.
    Plugin {
        /// Plugin management action
        #[command(subcommand)]
        action: PluginAction,
    },

    /// Generate shell completions.
    ///
    /// Generates completion scripts for various shells that can be sourced
    /// or saved to enable tab completion for this CLI.
    Completions {
        /// Target shell for completion generation
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let output_format = cli
        .format
        .parse::<OutputFormat>()
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    let exit_code = execute_command(cli.command, output_format).await?;

    std::process::exit(exit_code.as_i32());
}

/// Initializes logging infrastructure.
///
/// Logs go to stderr so formatted command output stays clean on stdout.
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

/// Routes commands to their handlers and returns an exit code.
async fn execute_command(command: Commands, output_format: OutputFormat) -> Result<ExitCode> {
    match command {
        Commands::Plugin { action } => commands::plugin::run(action, output_format).await,
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            commands::completions::run(shell, &mut cmd)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_import() {
        let cli = Cli::parse_from(["skein", "plugin", "import", "exec"]);
        match cli.command {
            Commands::Plugin {
                action: PluginAction::Import { spec, .. },
            } => assert_eq!(spec, "exec"),
            other => panic!("expected import action, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_import_flags() {
        let cli = Cli::parse_from([
            "skein",
            "plugin",
            "import",
            "./local.cjs",
            "--no-checksum",
            "--project",
            "/work/app",
        ]);
        match cli.command {
            Commands::Plugin {
                action:
                    PluginAction::Import {
                        spec,
                        no_checksum,
                        project,
                        ..
                    },
            } => {
                assert_eq!(spec, "./local.cjs");
                assert!(no_checksum);
                assert_eq!(project, Some("/work/app".into()));
            }
            other => panic!("expected import action, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_list_verify() {
        let cli = Cli::parse_from(["skein", "plugin", "list", "--verify"]);
        match cli.command {
            Commands::Plugin {
                action: PluginAction::List { verify, .. },
            } => assert!(verify),
            other => panic!("expected list action, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_remove_yes() {
        let cli = Cli::parse_from(["skein", "plugin", "remove", "exec", "-y"]);
        match cli.command {
            Commands::Plugin {
                action: PluginAction::Remove { name, yes, .. },
            } => {
                assert_eq!(name, "exec");
                assert!(yes);
            }
            other => panic!("expected remove action, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parsing_completions() {
        let cli = Cli::parse_from(["skein", "completions", "zsh"]);
        match cli.command {
            Commands::Completions { shell } => assert_eq!(shell, Shell::Zsh),
            other => panic!("expected completions, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_verbose_and_format_flags() {
        let cli = Cli::parse_from(["skein", "--verbose", "--format", "json", "plugin", "list"]);
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
    }

    #[test]
    fn test_cli_format_default() {
        let cli = Cli::parse_from(["skein", "plugin", "list"]);
        assert_eq!(cli.format, "pretty");
    }
}
