//! Random password generation.
//!
//! Characters are drawn from ASCII letters, digits, and punctuation,
//! minus any caller-excluded characters.  Sampling uses the thread-local
//! CSPRNG with unbiased range sampling, so every remaining character is
//! equally likely at every position.

use rand::Rng;

use crate::errors::{Result, VaultError};

/// Password length used when the caller does not specify one.
pub const DEFAULT_LENGTH: usize = 12;

const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

/// Build the generator alphabet with every character of `exclude` removed.
pub fn alphabet(exclude: &str) -> Vec<char> {
    LETTERS
        .chars()
        .chain(DIGITS.chars())
        .chain(PUNCTUATION.chars())
        .filter(|c| !exclude.contains(*c))
        .collect()
}

/// Generate a random password of `length` characters.
pub fn generate(length: usize, exclude: &str) -> Result<String> {
    if length < 1 {
        return Err(VaultError::InvalidParameter(
            "password length must be at least 1".into(),
        ));
    }

    let chars = alphabet(exclude);
    if chars.is_empty() {
        return Err(VaultError::InvalidParameter(
            "excluded characters leave an empty alphabet".into(),
        ));
    }

    let mut rng = rand::rng();
    let password = (0..length)
        .map(|_| chars[rng.random_range(0..chars.len())])
        .collect();
    Ok(password)
}
