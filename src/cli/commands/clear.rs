//! `pwvault clear`: remove every stored password.

use crate::cli::output;
use crate::cli::{confirm, open_store, Cli};
use crate::errors::Result;

/// Execute the `clear` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    if !confirm("Delete ALL stored passwords? This cannot be undone", force)? {
        output::info("Cancelled.");
        return Ok(());
    }

    let mut store = open_store(cli)?;
    let removed = store.clear_all()?;

    output::success(&format!("Cleared {removed} password(s)"));
    Ok(())
}
