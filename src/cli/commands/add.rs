//! `pwvault add`: encrypt and store a password for an account.

use std::io::{self, IsTerminal, Read};

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{generator_options, load_settings, open_store, Cli, GenerateArgs};
use crate::crypto::generate;
use crate::errors::{Result, VaultError};

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    account: &str,
    password: Option<&str>,
    generate_password: bool,
    options: &GenerateArgs,
    note: &str,
) -> Result<()> {
    if account.trim().is_empty() {
        return Err(VaultError::InvalidParameter(
            "account name cannot be empty".into(),
        ));
    }

    // Determine the password from one of four sources.
    let password = if generate_password {
        // Source 1: Generated.
        let (_, settings) = load_settings(cli)?;
        let (length, exclude) = generator_options(options, &settings);
        Zeroizing::new(generate(length, &exclude)?)
    } else if let Some(p) = password {
        // Source 2: Inline value on the command line.
        output::warning("Password provided on command line; it may appear in shell history.");
        Zeroizing::new(p.to_string())
    } else if !io::stdin().is_terminal() {
        // Source 3: Piped input (stdin is not a terminal).
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        Zeroizing::new(buf.trim_end().to_string())
    } else {
        // Source 4: Interactive secure prompt (default).
        let entered = dialoguer::Password::new()
            .with_prompt(format!("Enter password for {account}"))
            .with_confirmation("Confirm password", "Passwords do not match, try again")
            .interact()
            .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
        Zeroizing::new(entered)
    };

    if password.is_empty() {
        return Err(VaultError::InvalidParameter("password cannot be empty".into()));
    }

    let mut store = open_store(cli)?;
    let entry = store.create(account, &password, note)?;

    output::success(&format!(
        "Stored password for '{}' (id {})",
        entry.account, entry.id
    ));
    if generate_password {
        output::info(&format!("Generated password: {}", entry.password.as_str()));
    }

    Ok(())
}
