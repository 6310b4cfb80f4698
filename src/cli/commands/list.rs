//! `pwvault list`: display stored passwords in a table.

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, search: Option<&str>, show: bool) -> Result<()> {
    let store = open_store(cli)?;
    let entries = store.list(search)?;

    match search {
        Some(term) => output::info(&format!("{} match(es) for '{term}'", entries.len())),
        None => output::info(&format!("{} password(s) stored", entries.len())),
    }

    output::print_entries_table(&entries, show);

    Ok(())
}
