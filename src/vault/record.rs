//! Record types held by the password store.
//!
//! `StoredRecord` is a row exactly as persisted (password still
//! encrypted).  `PasswordEntry` is the decrypted view handed to callers;
//! its plaintext password is wiped from memory on drop and never shows up
//! in `Debug` output.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// A single row of the `passwords` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Store-assigned identity, never reused.
    pub id: i64,

    /// Account name (e.g. "alice@example.com").
    pub account: String,

    /// base64(nonce || ciphertext) produced by `crypto::encrypt`.
    pub encrypted_password: String,

    /// Free-form note, empty when none was given.
    pub note: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record with its password decrypted.
#[derive(Clone)]
pub struct PasswordEntry {
    pub id: i64,
    pub account: String,
    pub password: Zeroizing<String>,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PasswordEntry {
    /// Build the decrypted view of a stored row.
    pub(crate) fn from_stored(record: StoredRecord, password: Zeroizing<String>) -> Self {
        Self {
            id: record.id,
            account: record.account,
            password,
            note: record.note,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl std::fmt::Debug for PasswordEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordEntry")
            .field("id", &self.id)
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .field("note", &self.note)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let now = Utc::now();
        let entry = PasswordEntry {
            id: 1,
            account: "alice@example.com".into(),
            password: Zeroizing::new("hunter2".into()),
            note: String::new(),
            created_at: now,
            updated_at: now,
        };

        let rendered = format!("{entry:?}");
        assert!(rendered.contains("alice@example.com"));
        assert!(!rendered.contains("hunter2"));
    }
}
