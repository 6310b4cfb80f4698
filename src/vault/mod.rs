//! Vault module: encrypted password storage.
//!
//! This module provides:
//! - `StoredRecord` and `PasswordEntry` types (`record`)
//! - The SQLite-backed `PasswordStore` (`store`)
//! - JSON export/import of a whole store (`interchange`)

pub mod interchange;
pub mod record;
pub mod store;

// Re-export the most commonly used items.
pub use interchange::{export, import};
pub use record::{PasswordEntry, StoredRecord};
pub use store::PasswordStore;
