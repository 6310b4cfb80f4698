//! High-level password store used by CLI commands.
//!
//! `PasswordStore` owns a SQLite connection and the store's encryption
//! key, so the rest of the application can work with simple calls like
//! `store.create("alice@example.com", "hunter2", "")`.
//!
//! Identity comes from `INTEGER PRIMARY KEY AUTOINCREMENT`: SQLite keeps
//! the highest id ever handed out in `sqlite_sequence`, so ids are never
//! reused, even after deleting the newest record or clearing the table.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use tracing::{debug, error, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::encryption::{decrypt, encrypt};
use crate::crypto::keys::{self, EncryptionKey};
use crate::errors::{Result, VaultError};

use super::record::{PasswordEntry, StoredRecord};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS passwords (
    id                 INTEGER PRIMARY KEY AUTOINCREMENT,
    account            TEXT NOT NULL,
    encrypted_password TEXT NOT NULL,
    note               TEXT NOT NULL DEFAULT '',
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);";

const SELECT_ALL: &str = "SELECT id, account, encrypted_password, note, created_at, updated_at
     FROM passwords
     ORDER BY id ASC";

/// A record whose password is already encrypted under the store key,
/// waiting to be inserted.
#[derive(Debug, Clone)]
pub(crate) struct EncryptedEntry {
    pub account: String,
    pub encrypted_password: String,
    pub note: String,
}

/// The main store handle.  Open one with `PasswordStore::open`, then use
/// its methods to manage records.
pub struct PasswordStore {
    /// Connection to the SQLite database.
    conn: Connection,

    /// Path to the database file on disk.
    db_path: PathBuf,

    /// Path to the key file on disk.
    key_path: PathBuf,

    /// The store key (zeroized on drop).
    key: EncryptionKey,
}

impl PasswordStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Open the store at `db_path`, creating the database and the key file
    /// at `key_path` on first use.
    pub fn open(db_path: &Path, key_path: &Path) -> Result<Self> {
        ensure_parent_dir(db_path)?;

        let is_new = !db_path.exists();
        let conn = Connection::open(db_path).map_err(|e| {
            VaultError::Database(format!("cannot open {}: {e}", db_path.display()))
        })?;

        conn.execute_batch(SCHEMA)?;

        // Set restrictive permissions on a freshly created database.
        #[cfg(unix)]
        {
            if is_new {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o600);
                std::fs::set_permissions(db_path, perms)
                    .map_err(|e| VaultError::io_at(db_path, e))?;
            }
        }

        if !key_path.exists() {
            let existing = count_records(&conn)?;
            if existing > 0 {
                warn!(
                    records = existing,
                    key_file = %key_path.display(),
                    "key file missing for a populated database"
                );
                return Err(VaultError::KeyFile(format!(
                    "{} is missing but {} holds {existing} encrypted record(s); \
                     restore the key file instead of generating a new one",
                    key_path.display(),
                    db_path.display()
                )));
            }
        }
        let key = keys::load_or_create(key_path)?;

        debug!(
            db = %db_path.display(),
            fingerprint = %key.fingerprint(),
            is_new,
            "opened password store"
        );

        Ok(Self {
            conn,
            db_path: db_path.to_path_buf(),
            key_path: key_path.to_path_buf(),
            key,
        })
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Encrypt and store a new record.
    ///
    /// The returned entry carries the caller's plaintext so it can be
    /// shown right away without a decrypt round-trip.
    pub fn create(&mut self, account: &str, password: &str, note: &str) -> Result<PasswordEntry> {
        let encrypted_password = encrypt(&self.key, password.as_bytes())?;
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO passwords (account, encrypted_password, note, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![account, encrypted_password, note, now.to_rfc3339()],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(id, "created password record");

        Ok(PasswordEntry {
            id,
            account: account.to_string(),
            password: Zeroizing::new(password.to_string()),
            note: note.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Decrypt and return records in ascending id order.
    ///
    /// With a search term, only records whose account contains it
    /// (case-insensitively) are returned.  One undecryptable record fails
    /// the whole call.
    pub fn list(&self, search_term: Option<&str>) -> Result<Vec<PasswordEntry>> {
        let needle = search_term.map(str::to_lowercase);

        self.stored_records()?
            .into_iter()
            .filter(|r| {
                needle
                    .as_deref()
                    .map_or(true, |n| r.account.to_lowercase().contains(n))
            })
            .map(|r| self.decrypt_record(r))
            .collect()
    }

    /// Remove the record with `id`.  Returns `false` if there was none.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM passwords WHERE id = ?1", params![id])?;
        debug!(id, removed = removed > 0, "delete password record");
        Ok(removed > 0)
    }

    /// Remove every record in a single transaction.
    ///
    /// Returns how many records were removed.  On any failure the
    /// transaction is rolled back and the store is left untouched.
    pub fn clear_all(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM passwords", [])?;

        let remaining: i64 = tx.query_row("SELECT COUNT(*) FROM passwords", [], |row| row.get(0))?;
        if remaining != 0 {
            warn!(remaining, "clear left records behind, rolling back");
            return Err(VaultError::Database(format!(
                "clear left {remaining} records behind; rolled back"
            )));
        }

        tx.commit()?;
        debug!(removed, "cleared password store");
        Ok(removed)
    }

    /// Re-encrypt every record under a freshly generated key.
    ///
    /// All rows are updated in one transaction.  The new key file is put
    /// in place before commit; if the commit then fails, the previous key
    /// file is written back.  Returns the number of re-encrypted records.
    pub fn rotate_key(&mut self) -> Result<usize> {
        let records = self.stored_records()?;
        let new_key = EncryptionKey::generate();

        let mut rewritten = Vec::with_capacity(records.len());
        for record in &records {
            let plaintext = Zeroizing::new(decrypt(&self.key, &record.encrypted_password)?);
            rewritten.push((record.id, encrypt(&new_key, &plaintext)?));
        }

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE passwords SET encrypted_password = ?1, updated_at = ?2 WHERE id = ?3",
            )?;
            for (id, encrypted_password) in &rewritten {
                stmt.execute(params![encrypted_password, now, id])?;
            }
        }

        keys::save_key(&self.key_path, &new_key)?;
        if let Err(e) = tx.commit() {
            return Err(restore_key_after_failed_commit(&self.key_path, &self.key, e));
        }

        info!(
            records = rewritten.len(),
            old = %self.key.fingerprint(),
            new = %new_key.fingerprint(),
            "rotated encryption key"
        );
        self.key = new_key;
        Ok(rewritten.len())
    }

    // ------------------------------------------------------------------
    // Crate-internal access for the interchange codec
    // ------------------------------------------------------------------

    /// All rows exactly as stored, in ascending id order.
    pub(crate) fn stored_records(&self) -> Result<Vec<StoredRecord>> {
        let mut stmt = self.conn.prepare(SELECT_ALL)?;
        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    /// Insert already-encrypted entries in one transaction, all stamped
    /// with the same creation time.  Nothing is inserted if any row fails.
    pub(crate) fn insert_encrypted(&mut self, entries: &[EncryptedEntry]) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO passwords (account, encrypted_password, note, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.account,
                    entry.encrypted_password,
                    entry.note,
                    now
                ])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }

    /// The key every record in this store is encrypted under.
    pub(crate) fn key(&self) -> &EncryptionKey {
        &self.key
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the number of records in the store.
    pub fn len(&self) -> Result<usize> {
        count_records(&self.conn)
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the path to the database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Returns the path to the key file.
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Loggable fingerprint of the current key.
    pub fn key_fingerprint(&self) -> String {
        self.key.fingerprint()
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn decrypt_record(&self, record: StoredRecord) -> Result<PasswordEntry> {
        let plaintext = decrypt(&self.key, &record.encrypted_password).map_err(|e| {
            warn!(id = record.id, "record failed to decrypt");
            e
        })?;

        let password = String::from_utf8(plaintext).map_err(|e| {
            let mut bad_bytes = e.into_bytes();
            bad_bytes.zeroize();
            VaultError::SerializationError(format!(
                "password of record {} is not valid UTF-8",
                record.id
            ))
        })?;

        Ok(PasswordEntry::from_stored(record, Zeroizing::new(password)))
    }
}

fn count_records(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM passwords", [], |row| row.get(0))?;
    usize::try_from(count).map_err(|_| VaultError::Database(format!("invalid record count {count}")))
}

/// Put `old_key` back in the key file after a rotation commit failed.
///
/// If the restore fails too, the key file holds the new key while the
/// rows are still encrypted under `old_key`; the returned error names
/// both failures.
fn restore_key_after_failed_commit(
    key_path: &Path,
    old_key: &EncryptionKey,
    commit_err: rusqlite::Error,
) -> VaultError {
    warn!(error = %commit_err, "key rotation commit failed, restoring previous key file");
    match keys::save_key(key_path, old_key) {
        Ok(()) => commit_err.into(),
        Err(restore_err) => {
            error!(
                commit = %commit_err,
                restore = %restore_err,
                key_file = %key_path.display(),
                fingerprint = %old_key.fingerprint(),
                "key file no longer matches the database"
            );
            VaultError::KeyFile(format!(
                "key rotation commit failed ({commit_err}) and restoring the previous key to {} \
                 also failed ({restore_err}); records are still encrypted under key {}",
                key_path.display(),
                old_key.fingerprint()
            ))
        }
    }
}

/// Fail with a path-carrying I/O error when the parent directory of
/// `path` does not exist.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(
            VaultError::io_at(parent, io::Error::from(io::ErrorKind::NotFound)),
        ),
        _ => Ok(()),
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get(0)?,
        account: row.get(1)?,
        encrypted_password: row.get(2)?,
        note: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
        updated_at: parse_timestamp(row, 5)?,
    })
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> PasswordStore {
        PasswordStore::open(&dir.path().join("passwords.db"), &dir.path().join("key.key"))
            .unwrap()
    }

    #[test]
    fn open_creates_database_and_key_file() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(dir.path().join("passwords.db").exists());
        assert!(dir.path().join("key.key").exists());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn open_fails_with_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let result = PasswordStore::open(
            &dir.path().join("nope").join("passwords.db"),
            &dir.path().join("key.key"),
        );
        assert!(matches!(result, Err(VaultError::IoAt { .. })));
    }

    #[test]
    fn open_refuses_new_key_for_populated_database() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = open_store(&dir);
            store.create("a", "secret", "").unwrap();
        }
        std::fs::remove_file(dir.path().join("key.key")).unwrap();

        let result =
            PasswordStore::open(&dir.path().join("passwords.db"), &dir.path().join("key.key"));
        assert!(matches!(result, Err(VaultError::KeyFile(_))));
        assert!(!dir.path().join("key.key").exists());
    }

    #[test]
    fn open_creates_key_for_empty_existing_database() {
        let dir = TempDir::new().unwrap();
        drop(open_store(&dir));
        std::fs::remove_file(dir.path().join("key.key")).unwrap();

        let store = open_store(&dir);
        assert!(store.is_empty().unwrap());
        assert!(dir.path().join("key.key").exists());
    }

    #[test]
    fn failed_commit_restores_previous_key_file() {
        let dir = TempDir::new().unwrap();
        let key_path = dir.path().join("key.key");
        let old_key = EncryptionKey::generate();
        keys::save_key(&key_path, &EncryptionKey::generate()).unwrap();

        let err = restore_key_after_failed_commit(
            &key_path,
            &old_key,
            rusqlite::Error::QueryReturnedNoRows,
        );
        assert!(matches!(err, VaultError::Database(_)));

        let on_disk = keys::load_or_create(&key_path).unwrap();
        assert!(on_disk.matches(&old_key));
    }

    #[test]
    fn failed_restore_reports_both_errors() {
        let dir = TempDir::new().unwrap();
        let key_path = dir.path().join("gone").join("key.key");
        let old_key = EncryptionKey::generate();

        let err = restore_key_after_failed_commit(
            &key_path,
            &old_key,
            rusqlite::Error::QueryReturnedNoRows,
        );
        let message = match err {
            VaultError::KeyFile(message) => message,
            other => panic!("expected KeyFile error, got {other:?}"),
        };
        assert!(message.contains("commit failed"));
        assert!(message.contains("also failed"));
        assert!(message.contains(&old_key.fingerprint()));
    }

    #[test]
    fn ciphertext_is_stored_not_plaintext() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.create("acct", "plain-secret", "").unwrap();

        let rows = store.stored_records().unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].encrypted_password.contains("plain-secret"));
    }

    #[test]
    fn account_with_sql_metacharacters_is_stored_verbatim() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let account = "x'); DROP TABLE passwords; --";
        store.create(account, "pw", "100% _odd_ note").unwrap();

        let all = store.list(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].account, account);
        assert_eq!(all[0].note, "100% _odd_ note");
        assert_eq!(store.list(Some("%")).unwrap().len(), 0);
    }

    #[test]
    fn corrupted_row_fails_list() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.create("good", "pw", "").unwrap();
        store
            .conn
            .execute(
                "INSERT INTO passwords (account, encrypted_password, note, created_at, updated_at)
                 VALUES ('bad', 'AAAA', '', ?1, ?1)",
                params![Utc::now().to_rfc3339()],
            )
            .unwrap();

        assert!(matches!(store.list(None), Err(VaultError::DecryptionFailed)));
        // A search that skips the corrupted row still works.
        assert_eq!(store.list(Some("good")).unwrap().len(), 1);
    }

    #[test]
    fn insert_encrypted_stamps_fresh_equal_timestamps() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let encrypted_password = encrypt(store.key(), b"pw").unwrap();
        let entries = vec![
            EncryptedEntry {
                account: "a".into(),
                encrypted_password: encrypted_password.clone(),
                note: String::new(),
            },
            EncryptedEntry {
                account: "b".into(),
                encrypted_password,
                note: "n".into(),
            },
        ];

        assert_eq!(store.insert_encrypted(&entries).unwrap(), 2);
        let rows = store.stored_records().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].created_at, rows[0].updated_at);
        assert_eq!(rows[0].created_at, rows[1].created_at);
    }

    #[cfg(unix)]
    #[test]
    fn database_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let _store = open_store(&dir);

        let perms = std::fs::metadata(dir.path().join("passwords.db"))
            .unwrap()
            .permissions();
        assert_eq!(perms.mode() & 0o777, 0o600);
    }
}
