//! `pwvault import`: add records from a file produced by `export`.

use std::path::Path;

use crate::cli::output;
use crate::cli::{open_store, Cli};
use crate::errors::{Result, VaultError};
use crate::vault;

/// Execute the `import` command.
pub fn execute(cli: &Cli, file: &str) -> Result<()> {
    let source = Path::new(file);
    if !source.exists() {
        return Err(VaultError::CommandFailed(format!(
            "import file not found: {}",
            source.display()
        )));
    }

    let mut store = open_store(cli)?;
    let count = vault::import(&mut store, source)?;

    if count == 0 {
        output::warning("No passwords found in the import file.");
    } else {
        output::success(&format!("Imported {count} password(s) from {file}"));
    }

    Ok(())
}
