//! `pwvault rotate-key`: re-encrypt every password under a new key.

use crate::cli::output;
use crate::cli::{confirm, open_store, Cli};
use crate::errors::Result;

/// Execute the `rotate-key` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    if !confirm(
        "Rotate the encryption key? Earlier export files keep working only with their own key",
        force,
    )? {
        output::info("Cancelled.");
        return Ok(());
    }

    let mut store = open_store(cli)?;
    let count = store.rotate_key()?;

    output::success(&format!(
        "Key rotated ({count} password(s) re-encrypted, new key {})",
        store.key_fingerprint()
    ));

    Ok(())
}
