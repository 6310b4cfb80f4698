//! `pwvault completions`: print a shell completion script.
//!
//!   pwvault completions bash > ~/.local/share/bash-completion/completions/pwvault

use std::io;

use clap::CommandFactory;
use clap_complete::Shell;

use crate::cli::Cli;
use crate::errors::{Result, VaultError};

/// Execute the `completions` command.
pub fn execute(shell: &str) -> Result<()> {
    let shell = parse_shell(shell)?;
    clap_complete::generate(shell, &mut Cli::command(), "pwvault", &mut io::stdout());
    Ok(())
}

fn parse_shell(name: &str) -> Result<Shell> {
    let shell = match name.to_ascii_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "elvish" => Shell::Elvish,
        "powershell" | "pwsh" | "ps" => Shell::PowerShell,
        other => {
            return Err(VaultError::CommandFailed(format!(
                "unknown shell '{other}' (supported: bash, zsh, fish, elvish, powershell)"
            )))
        }
    };
    Ok(shell)
}
