//! Cryptographic primitives for pwvault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption of password fields (`encryption`)
//! - The persisted store key and its key file (`keys`)
//! - Random password generation (`generator`)

pub mod encryption;
pub mod generator;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, generate, ...};
pub use encryption::{decrypt, encrypt};
pub use generator::{generate, DEFAULT_LENGTH};
pub use keys::{load_or_create, EncryptionKey, KEY_LEN};
