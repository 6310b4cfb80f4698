//! `pwvault generate`: print a random password without storing it.

use zeroize::Zeroizing;

use crate::cli::{generator_options, load_settings, Cli, GenerateArgs};
use crate::crypto::generate;
use crate::errors::Result;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, args: &GenerateArgs) -> Result<()> {
    let (_, settings) = load_settings(cli)?;
    let (length, exclude) = generator_options(args, &settings);

    let password = Zeroizing::new(generate(length, &exclude)?);
    println!("{}", password.as_str());

    Ok(())
}
