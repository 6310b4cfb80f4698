//! Key file management.
//!
//! A store is encrypted under one 32-byte AES-256 key.  The key lives in
//! its own file next to the database, written as base64 text with
//! owner-only permissions.  `load_or_create` is the only way the rest of
//! the crate obtains a key.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::info;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Result, VaultError};
use crate::fsio;

/// Length of the encryption key in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// A 32-byte encryption key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// Create a key from raw bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rng().fill_bytes(&mut bytes);
        let key = Self::new(bytes);
        bytes.zeroize();
        key
    }

    /// Decode a base64 key string.
    ///
    /// Surrounding whitespace is ignored so hand-edited files with a
    /// trailing newline still load.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| VaultError::KeyFile(format!("key is not valid base64: {e}")))?;

        if decoded.len() != KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(VaultError::KeyFile(format!(
                "key must be exactly {KEY_LEN} bytes, got {len}"
            )));
        }

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        let key = Self::new(bytes);
        bytes.zeroize();
        Ok(key)
    }

    /// Encode the key as base64 text.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(BASE64.encode(self.bytes))
    }

    /// Access the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Constant-time equality check against another key.
    pub fn matches(&self, other: &EncryptionKey) -> bool {
        self.bytes.ct_eq(&other.bytes).into()
    }

    /// Short hex fingerprint (first 8 bytes of SHA-256) safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.bytes);
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Load the key stored at `path`, or generate and persist a new one.
///
/// An existing file is never modified.
pub fn load_or_create(path: &Path) -> Result<EncryptionKey> {
    if path.exists() {
        let encoded = Zeroizing::new(
            fs::read_to_string(path).map_err(|e| VaultError::io_at(path, e))?,
        );
        return EncryptionKey::from_base64(&encoded);
    }

    // Created exclusively, so two racing initializations cannot clobber
    // each other.
    let key = EncryptionKey::generate();
    fsio::create_private(path, key.to_base64().as_bytes())?;
    info!(
        path = %path.display(),
        fingerprint = %key.fingerprint(),
        "generated new encryption key"
    );
    Ok(key)
}

/// Replace the key file at `path` atomically (temp file + rename).
pub(crate) fn save_key(path: &Path, key: &EncryptionKey) -> Result<()> {
    fsio::write_private(path, key.to_base64().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_or_create_generates_then_reloads_same_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.key");

        let created = load_or_create(&path).unwrap();
        assert!(path.exists());

        let loaded = load_or_create(&path).unwrap();
        assert!(created.matches(&loaded));
    }

    #[test]
    fn key_file_holds_base64_text() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.key");

        let key = load_or_create(&path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, *key.to_base64());
    }

    #[test]
    fn load_fails_when_parent_directory_is_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("key.key");

        let err = load_or_create(&path).err().unwrap();
        assert!(matches!(err, VaultError::IoAt { .. }));
    }

    #[test]
    fn load_rejects_wrong_length_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.key");
        fs::write(&path, BASE64.encode([0u8; 16])).unwrap();

        let err = load_or_create(&path).err().unwrap();
        assert!(matches!(err, VaultError::KeyFile(_)));
    }

    #[test]
    fn load_rejects_non_base64_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.key");
        fs::write(&path, "not base64 at all!").unwrap();

        let err = load_or_create(&path).err().unwrap();
        assert!(matches!(err, VaultError::KeyFile(_)));
    }

    #[test]
    fn load_tolerates_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.key");
        let key = EncryptionKey::new([0x5Au8; KEY_LEN]);
        fs::write(&path, format!("{}\n", *key.to_base64())).unwrap();

        let loaded = load_or_create(&path).unwrap();
        assert!(loaded.matches(&key));
    }

    #[test]
    fn save_key_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.key");
        let first = load_or_create(&path).unwrap();

        let second = EncryptionKey::generate();
        save_key(&path, &second).unwrap();

        let loaded = load_or_create(&path).unwrap();
        assert!(loaded.matches(&second));
        assert!(!loaded.matches(&first));
    }

    #[test]
    fn generated_keys_differ() {
        let a = EncryptionKey::generate();
        let b = EncryptionKey::generate();
        assert!(!a.matches(&b));
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_is_stable_hex() {
        let key = EncryptionKey::new([0x42u8; KEY_LEN]);
        let fp = key.fingerprint();
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, key.fingerprint());
    }

    #[cfg(unix)]
    #[test]
    fn key_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key.key");
        load_or_create(&path).unwrap();

        let perms = fs::metadata(&path).unwrap().permissions();
        assert_eq!(
            perms.mode() & 0o777,
            0o600,
            "key file should have 0o600 permissions"
        );
    }
}
