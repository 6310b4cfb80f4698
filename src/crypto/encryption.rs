//! AES-256-GCM authenticated encryption of single password fields.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  The combined buffer is base64-encoded
//! so it can be stored in a TEXT column and in the JSON interchange file.
//!
//! Layout of the decoded buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::keys::EncryptionKey;
use crate::errors::{Result, VaultError};

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// Encrypt `plaintext` and return base64(nonce || ciphertext).
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(output))
}

/// Decrypt a string produced by `encrypt`.
///
/// Bad base64, a truncated buffer, and a failed tag check all map to
/// `DecryptionFailed`.
pub fn decrypt(key: &EncryptionKey, encoded: &str) -> Result<Vec<u8>> {
    let data = BASE64
        .decode(encoded)
        .map_err(|_| VaultError::DecryptionFailed)?;

    if data.len() < NONCE_LEN + TAG_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::DecryptionFailed)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| VaultError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::KEY_LEN;

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = EncryptionKey::new([7u8; KEY_LEN]);
        let ct = encrypt(&key, b"").unwrap();
        assert_eq!(decrypt(&key, &ct).unwrap(), b"");
    }

    #[test]
    fn output_is_base64_of_nonce_and_tag() {
        let key = EncryptionKey::new([7u8; KEY_LEN]);
        let ct = encrypt(&key, b"abc").unwrap();
        let raw = BASE64.decode(&ct).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 3 + TAG_LEN);
    }

    #[test]
    fn decrypt_rejects_invalid_base64() {
        let key = EncryptionKey::new([7u8; KEY_LEN]);
        assert!(matches!(
            decrypt(&key, "%%% not base64 %%%"),
            Err(VaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn decrypt_rejects_nonce_only_buffer() {
        let key = EncryptionKey::new([7u8; KEY_LEN]);
        let short = BASE64.encode([0u8; NONCE_LEN]);
        assert!(matches!(
            decrypt(&key, &short),
            Err(VaultError::DecryptionFailed)
        ));
    }
}
