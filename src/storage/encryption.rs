// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passphrase-based encryption of item records.
//!
//! ## Format
//!
//! ```text
//! base64( format (1) || salt (16) || nonce (12) || ciphertext || tag (16) )
//! ```
//!
//! The AES-256-GCM key is derived per ciphertext with HKDF-SHA256 from the
//! process passphrase and a random salt, so encrypting the same record twice
//! never produces the same output.
//!
//! The passphrase is a server-side secret with high entropy (it is never a
//! user-chosen password), which is why HKDF is used instead of a password
//! hashing function.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64ct::{Base64, Encoding};
use hkdf::Hkdf;
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Format byte prefixed to every ciphertext.
const FORMAT_V1: u8 = 1;
/// Size of the AES-256 key in bytes.
const KEY_SIZE: usize = 32;
/// Size of the per-ciphertext HKDF salt in bytes.
const SALT_SIZE: usize = 16;
/// Size of the GCM nonce in bytes.
const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes.
const TAG_SIZE: usize = 16;
/// HKDF context string binding derived keys to this use.
const HKDF_INFO: &[u8] = b"secret-manager-item-v1";

/// Errors produced by the item codec.
#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    /// The configured passphrase is empty.
    #[error("encryption passphrase must be set")]
    MissingPassphrase,
    /// The record could not be serialized or encrypted.
    #[error("encryption failed: {0}")]
    Encryption(String),
    /// The ciphertext could not be decoded under the configured passphrase.
    #[error("decryption failed: {0}")]
    Decryption(String),
}

/// Passphrase held for the lifetime of the process, zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
struct Passphrase(Vec<u8>);

/// Symmetric codec for item records.
///
/// Built once at start-up from the configured passphrase and shared by
/// reference with every repository instance.
#[derive(Clone)]
pub struct PassphraseCipher {
    passphrase: Passphrase,
}

impl PassphraseCipher {
    /// Create a codec for the given passphrase.
    ///
    /// # Errors
    /// Returns [`CipherError::MissingPassphrase`] if the passphrase is empty.
    pub fn new(passphrase: impl AsRef<str>) -> Result<Self, CipherError> {
        let passphrase = passphrase.as_ref();
        if passphrase.is_empty() {
            return Err(CipherError::MissingPassphrase);
        }
        Ok(Self {
            passphrase: Passphrase(passphrase.as_bytes().to_vec()),
        })
    }

    /// Serialize `record` as JSON and encrypt it.
    pub fn encrypt<T: Serialize>(&self, record: &T) -> Result<String, CipherError> {
        let plaintext = Zeroizing::new(
            serde_json::to_vec(record).map_err(|e| CipherError::Encryption(e.to_string()))?,
        );

        let mut salt = [0u8; SALT_SIZE];
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        let mut rng = rand::thread_rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce_bytes);

        let cipher = self.cipher_for(&salt)?;
        let ciphertext = cipher
            .encrypt(&Nonce::from(nonce_bytes), plaintext.as_slice())
            .map_err(|_| CipherError::Encryption("AES-GCM encryption error".to_string()))?;

        let mut blob = Vec::with_capacity(1 + SALT_SIZE + NONCE_SIZE + ciphertext.len());
        blob.push(FORMAT_V1);
        blob.extend_from_slice(&salt);
        blob.extend_from_slice(&nonce_bytes);
        blob.extend(ciphertext);

        Ok(Base64::encode_string(&blob))
    }

    /// Decrypt `ciphertext` and parse the JSON record it contains.
    pub fn decrypt<T: DeserializeOwned>(&self, ciphertext: &str) -> Result<T, CipherError> {
        let blob = Base64::decode_vec(ciphertext)
            .map_err(|_| CipherError::Decryption("ciphertext is not valid base64".to_string()))?;

        if blob.len() < 1 + SALT_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::Decryption("ciphertext too short".to_string()));
        }
        if blob[0] != FORMAT_V1 {
            return Err(CipherError::Decryption(format!(
                "unknown ciphertext format {}",
                blob[0]
            )));
        }

        let (salt, rest) = blob[1..].split_at(SALT_SIZE);
        let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);
        let nonce: [u8; NONCE_SIZE] = nonce_bytes
            .try_into()
            .map_err(|_| CipherError::Decryption("ciphertext too short".to_string()))?;

        let cipher = self.cipher_for(salt)?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(&Nonce::from(nonce), sealed)
                .map_err(|_| {
                    CipherError::Decryption("wrong passphrase or corrupted data".to_string())
                })?,
        );

        serde_json::from_slice(plaintext.as_slice())
            .map_err(|e| CipherError::Decryption(format!("invalid record: {e}")))
    }

    fn cipher_for(&self, salt: &[u8]) -> Result<Aes256Gcm, CipherError> {
        let hk = Hkdf::<Sha256>::new(Some(salt), &self.passphrase.0);
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        hk.expand(HKDF_INFO, &mut key[..])
            .map_err(|_| CipherError::Encryption("HKDF expand failed".to_string()))?;
        Aes256Gcm::new_from_slice(&key[..])
            .map_err(|_| CipherError::Encryption("invalid AES-256 key length".to_string()))
    }
}

impl std::fmt::Debug for PassphraseCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseCipher")
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Encrypt `record` under `passphrase`.
pub fn encrypt<T: Serialize>(record: &T, passphrase: &str) -> Result<String, CipherError> {
    PassphraseCipher::new(passphrase)?.encrypt(record)
}

/// Decrypt `ciphertext` under `passphrase`.
pub fn decrypt<T: DeserializeOwned>(ciphertext: &str, passphrase: &str) -> Result<T, CipherError> {
    PassphraseCipher::new(passphrase)?.decrypt(ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Record {
        title: String,
        secret: String,
    }

    fn record() -> Record {
        Record {
            title: "myTitle".to_string(),
            secret: "mySecret".to_string(),
        }
    }

    #[test]
    fn round_trip_restores_record() {
        let cipher = PassphraseCipher::new("correct horse battery staple").unwrap();
        let encrypted = cipher.encrypt(&record()).unwrap();
        let decrypted: Record = cipher.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, record());
    }

    #[test]
    fn output_is_base64() {
        let encrypted = encrypt(&record(), "passphrase").unwrap();
        assert!(Base64::decode_vec(&encrypted).is_ok());
        assert!(!encrypted.contains("mySecret"));
    }

    #[test]
    fn same_record_encrypts_differently() {
        let cipher = PassphraseCipher::new("passphrase").unwrap();
        let a = cipher.encrypt(&record()).unwrap();
        let b = cipher.encrypt(&record()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_passphrase_is_rejected() {
        assert!(matches!(
            PassphraseCipher::new(""),
            Err(CipherError::MissingPassphrase)
        ));
        assert!(matches!(
            encrypt(&record(), ""),
            Err(CipherError::MissingPassphrase)
        ));
        assert!(matches!(
            decrypt::<Record>("AAAA", ""),
            Err(CipherError::MissingPassphrase)
        ));
    }

    #[test]
    fn wrong_passphrase_fails_to_decrypt() {
        let encrypted = encrypt(&record(), "right").unwrap();
        let result = decrypt::<Record>(&encrypted, "wrong");
        assert!(matches!(result, Err(CipherError::Decryption(_))));
    }

    #[test]
    fn corrupted_ciphertext_fails_to_decrypt() {
        let cipher = PassphraseCipher::new("passphrase").unwrap();
        let encrypted = cipher.encrypt(&record()).unwrap();

        let mut blob = Base64::decode_vec(&encrypted).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0xff;
        let tampered = Base64::encode_string(&blob);

        assert!(matches!(
            cipher.decrypt::<Record>(&tampered),
            Err(CipherError::Decryption(_))
        ));
        assert!(matches!(
            cipher.decrypt::<Record>("not base64!"),
            Err(CipherError::Decryption(_))
        ));
        assert!(matches!(
            cipher.decrypt::<Record>("AQID"),
            Err(CipherError::Decryption(_))
        ));
    }

    #[test]
    fn debug_redacts_passphrase() {
        let cipher = PassphraseCipher::new("hunter2").unwrap();
        let debug = format!("{cipher:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("REDACTED"));
    }
}
