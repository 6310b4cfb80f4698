//! `pwvault export`: write all records and the key to a JSON file.

use std::path::Path;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::Result;
use crate::vault;

/// Execute the `export` command.
pub fn execute(cli: &Cli, file: &str) -> Result<()> {
    let store = open_store(cli)?;
    let count = vault::export(&store, Path::new(file))?;

    output::success(&format!("Exported {count} password(s) to {file}"));
    output::warning("The export file contains the encryption key. Keep it private.");

    Ok(())
}
