//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;
use dialoguer::Confirm;

use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::vault::PasswordStore;

/// pwvault CLI: local encrypted password vault.
#[derive(Parser)]
#[command(
    name = "pwvault",
    about = "Local encrypted password vault and generator",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the database and key file (default: from .pwvault.toml or .pwvault)
    #[arg(long, global = true, env = "PWVAULT_DIR")]
    pub vault_dir: Option<String>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Generate a random password without storing it
    Generate {
        #[command(flatten)]
        options: GenerateArgs,
    },

    /// Store a password for an account
    Add {
        /// Account name (e.g. alice@example.com)
        account: String,

        /// Password value (omit for prompt or piped stdin)
        #[arg(short, long, conflicts_with = "generate")]
        password: Option<String>,

        /// Generate a random password instead of entering one
        #[arg(short, long)]
        generate: bool,

        #[command(flatten)]
        options: GenerateArgs,

        /// Free-form note stored with the password
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// List stored passwords, optionally filtered by account
    List {
        /// Case-insensitive substring of the account name
        search: Option<String>,

        /// Show passwords in clear text instead of masking them
        #[arg(long)]
        show: bool,
    },

    /// Delete a stored password by id
    Delete {
        /// Record id (see `pwvault list`)
        id: i64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Delete every stored password
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export all records and the key to a JSON file
    Export {
        /// Output file path
        file: String,
    },

    /// Import records from a JSON file produced by `export`
    Import {
        /// Path to the file to import
        file: String,
    },

    /// Re-encrypt every password under a new key
    RotateKey {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

/// Options shared by `generate` and `add --generate`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// Password length (default: from config, or 12)
    #[arg(short, long)]
    pub length: Option<usize>,

    /// Characters to leave out of generated passwords
    #[arg(short = 'x', long)]
    pub exclude: Option<String>,
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load settings from the working directory and apply CLI overrides.
pub fn load_settings(cli: &Cli) -> Result<(PathBuf, Settings)> {
    let cwd = std::env::current_dir()?;
    let mut settings = Settings::load(&cwd)?;
    if let Some(dir) = &cli.vault_dir {
        settings.vault_dir = dir.clone();
    }
    Ok((cwd, settings))
}

/// Open the password store, creating the vault directory on first use.
pub fn open_store(cli: &Cli) -> Result<PasswordStore> {
    let (cwd, settings) = load_settings(cli)?;

    let vault_dir = settings.vault_dir_path(&cwd);
    if !vault_dir.exists() {
        std::fs::create_dir_all(&vault_dir).map_err(|e| VaultError::io_at(&vault_dir, e))?;
        output::info(&format!("Created vault directory: {}", vault_dir.display()));
    }

    PasswordStore::open(&settings.database_path(&cwd), &settings.key_path(&cwd))
}

/// Ask a yes/no question, defaulting to "no".
///
/// Returns `true` immediately when `force` is set.
pub fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }

    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Resolve generator options against configured defaults.
pub fn generator_options(args: &GenerateArgs, settings: &Settings) -> (usize, String) {
    let length = args.length.unwrap_or(settings.password_length);
    let exclude = args
        .exclude
        .clone()
        .unwrap_or_else(|| settings.exclude_chars.clone());
    (length, exclude)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generator_options_prefer_flags_over_settings() {
        let settings = Settings {
            password_length: 30,
            exclude_chars: "abc".into(),
            ..Settings::default()
        };

        let args = GenerateArgs {
            length: Some(8),
            exclude: None,
        };
        assert_eq!(generator_options(&args, &settings), (8, "abc".to_string()));

        let args = GenerateArgs {
            length: None,
            exclude: Some(String::new()),
        };
        assert_eq!(generator_options(&args, &settings), (30, String::new()));
    }

    #[test]
    fn add_rejects_password_with_generate() {
        let result = Cli::try_parse_from(["pwvault", "add", "acct", "-p", "x", "--generate"]);
        assert!(result.is_err());
    }

    #[test]
    fn confirm_with_force_skips_prompt() {
        assert!(confirm("Really?", true).unwrap());
    }
}
