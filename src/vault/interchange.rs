//! JSON export/import of a whole store.
//!
//! An interchange file carries the store key next to every record's
//! ciphertext, so it can seed a brand-new vault on its own:
//!
//! ```text
//! {
//!   "key": "<base64 key>",
//!   "passwords": [
//!     {"id": 1, "account": "...", "encrypted_password": "...", "note": "...",
//!      "created_at": "2024-05-01T10:00:00+00:00", "updated_at": "..."}
//!   ]
//! }
//! ```
//!
//! Import always creates new records.  When the file's key differs from
//! the store's key, each password is decrypted with the file key and
//! re-encrypted under the store key; when the keys match the ciphertext
//! is copied as-is without being decrypted.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::keys::EncryptionKey;
use crate::errors::{Result, VaultError};
use crate::fsio;

use super::record::StoredRecord;
use super::store::{EncryptedEntry, PasswordStore};

/// Top-level shape of an interchange file.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct InterchangeFile {
    /// The store key, base64-encoded.
    key: String,
    passwords: Vec<ExportedRecord>,
}

impl Drop for InterchangeFile {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// One record inside an interchange file.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportedRecord {
    id: i64,
    account: String,
    encrypted_password: String,
    /// Missing or `null` notes import as empty.
    #[serde(default)]
    note: Option<String>,
    #[serde(with = "timestamp")]
    created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    updated_at: DateTime<Utc>,
}

impl From<StoredRecord> for ExportedRecord {
    fn from(record: StoredRecord) -> Self {
        Self {
            id: record.id,
            account: record.account,
            encrypted_password: record.encrypted_password,
            note: Some(record.note),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Write every record of `store` plus its key to `destination`.
///
/// Passwords stay encrypted.  The file is written atomically with
/// owner-only permissions.  Returns the number of exported records.
pub fn export(store: &PasswordStore, destination: &Path) -> Result<usize> {
    if is_same_file(destination, store.db_path()) || is_same_file(destination, store.key_path())
    {
        return Err(VaultError::InvalidParameter(format!(
            "refusing to export over the store's own file {}",
            destination.display()
        )));
    }

    let passwords: Vec<ExportedRecord> = store
        .stored_records()?
        .into_iter()
        .map(ExportedRecord::from)
        .collect();
    let count = passwords.len();

    let document = InterchangeFile {
        key: store.key().to_base64().to_string(),
        passwords,
    };

    let json = Zeroizing::new(
        serde_json::to_string_pretty(&document)
            .map_err(|e| VaultError::SerializationError(format!("export: {e}")))?,
    );
    fsio::write_private(destination, json.as_bytes())?;

    info!(
        records = count,
        destination = %destination.display(),
        "exported password store"
    );
    Ok(count)
}

/// Read an interchange file and add every entry to `store` as a new record.
///
/// Ids and timestamps from the file are not reused.  All entries are
/// inserted in one transaction.  Returns the number of imported records.
pub fn import(store: &mut PasswordStore, source: &Path) -> Result<usize> {
    let contents =
        Zeroizing::new(fs::read_to_string(source).map_err(|e| VaultError::io_at(source, e))?);
    let document = parse_document(&contents)
        .map_err(|e| VaultError::MalformedFile(format!("{}: {e}", source.display())))?;

    let file_key = EncryptionKey::from_base64(&document.key)
        .map_err(|e| VaultError::MalformedFile(format!("{}: {e}", source.display())))?;
    let same_key = file_key.matches(store.key());

    let mut entries = Vec::with_capacity(document.passwords.len());
    for record in &document.passwords {
        let encrypted_password = if same_key {
            record.encrypted_password.clone()
        } else {
            reencrypt(&file_key, store.key(), &record.encrypted_password)?
        };
        entries.push(EncryptedEntry {
            account: record.account.clone(),
            encrypted_password,
            note: record.note.clone().unwrap_or_default(),
        });
    }

    let count = store.insert_encrypted(&entries)?;
    info!(
        records = count,
        reencrypted = !same_key,
        source = %source.display(),
        "imported password records"
    );
    Ok(count)
}

/// Parse an interchange document, accepting only the object form.
///
/// Derived struct deserializers also take positional JSON arrays, so the
/// top level and every `passwords` element are checked to be objects
/// before the typed conversion.
fn parse_document(contents: &str) -> std::result::Result<InterchangeFile, String> {
    let value: Value = serde_json::from_str(contents).map_err(|e| e.to_string())?;

    let Value::Object(fields) = &value else {
        return Err("expected a JSON object at the top level".into());
    };
    if let Some(Value::Array(passwords)) = fields.get("passwords") {
        if let Some(index) = passwords.iter().position(|p| !p.is_object()) {
            return Err(format!("passwords[{index}] is not a JSON object"));
        }
    }

    serde_json::from_value(value).map_err(|e| e.to_string())
}

/// Decrypt `ciphertext` under `from` and encrypt the plaintext under `to`.
fn reencrypt(from: &EncryptionKey, to: &EncryptionKey, ciphertext: &str) -> Result<String> {
    let plaintext = Zeroizing::new(decrypt(from, ciphertext)?);
    encrypt(to, &plaintext)
}

/// True when both paths name the same existing file.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Serde helpers for interchange timestamps.
///
/// Written as RFC 3339.  Read as RFC 3339, or as a naive ISO-8601
/// date-time (no offset) which is taken to be UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
