//! `pwvault delete`: remove one password by id.

use crate::cli::output;
use crate::cli::{confirm, open_store, Cli};
use crate::errors::Result;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: i64, force: bool) -> Result<()> {
    if !confirm(&format!("Delete password #{id}?"), force)? {
        output::info("Cancelled.");
        return Ok(());
    }

    let mut store = open_store(cli)?;
    if store.delete(id)? {
        output::success(&format!("Deleted password #{id}"));
    } else {
        output::warning(&format!("No password with id {id}"));
    }

    Ok(())
}
