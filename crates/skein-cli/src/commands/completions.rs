//! Shell completion generation.

use anyhow::Result;
use clap::Command;
use clap_complete::Shell;
use skein_core::cli::ExitCode;

/// Generates completion script for the given shell on stdout.
///
/// # Errors
///
/// Infallible today; returns `Result` for consistency with other commands.
pub fn run(shell: Shell, cmd: &mut Command) -> Result<ExitCode> {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, cmd, name, &mut std::io::stdout());
    Ok(ExitCode::SUCCESS)
}
