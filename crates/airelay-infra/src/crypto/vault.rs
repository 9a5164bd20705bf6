//! AES-256-GCM encryption for provider credentials at rest.
//!
//! The 32-byte master key comes from one of:
//! - `AIRELAY_VAULT_PASSWORD`, stretched with Argon2id
//! - a `vault.key` file in the data directory, generated on first use
//!
//! Encrypted format: `nonce (12 bytes) || ciphertext`
//!
//! SECURITY: Error types never contain plaintext or key material.

use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use thiserror::Error;

/// Nonce size for AES-256-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

/// Environment variable holding an optional vault password.
pub const VAULT_PASSWORD_ENV: &str = "AIRELAY_VAULT_PASSWORD";

/// Key file name inside the data directory.
pub const KEY_FILE_NAME: &str = "vault.key";

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("invalid ciphertext: too short")]
    CiphertextTooShort,

    #[error("key derivation failed")]
    KeyDerivationFailed,

    #[error("key file unreadable: {0}")]
    KeyFile(String),

    #[error("key file corrupted")]
    CorruptedKeyFile,
}

/// Symmetric cipher for credentials.
///
/// Each encryption uses a fresh random nonce, so the same credential
/// encrypts to different bytes every time it is saved.
pub struct VaultCrypto {
    cipher: Aes256Gcm,
}

impl VaultCrypto {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.into()),
        }
    }

    /// Derive the key from a password using Argon2id (19 MiB, 2 passes).
    ///
    /// The salt is fixed so the same password always yields the same key.
    pub fn from_password(password: &str) -> Result<Self, VaultError> {
        use argon2::{Algorithm, Argon2, Params, Version};

        let params = Params::new(19456, 2, 1, Some(32))
            .map_err(|_| VaultError::KeyDerivationFailed)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; 32];
        argon2
            .hash_password_into(password.as_bytes(), b"airelay-vault-v1", &mut key)
            .map_err(|_| VaultError::KeyDerivationFailed)?;

        Ok(Self::new(&key))
    }

    /// Load the hex-encoded key at `path`, generating and writing a random
    /// one if the file does not exist yet.
    pub fn from_key_file(path: &Path) -> Result<Self, VaultError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let bytes = hex_decode(contents.trim()).map_err(|_| VaultError::CorruptedKeyFile)?;
                let key: [u8; 32] = bytes
                    .try_into()
                    .map_err(|_| VaultError::CorruptedKeyFile)?;
                Ok(Self::new(&key))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let key = rand_bytes();
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| VaultError::KeyFile(e.to_string()))?;
                }
                std::fs::write(path, hex_encode(&key)).map_err(|e| VaultError::KeyFile(e.to_string()))?;
                restrict_permissions(path);
                tracing::info!(path = %path.display(), "Generated new vault key");
                Ok(Self::new(&key))
            }
            Err(e) => Err(VaultError::KeyFile(e.to_string())),
        }
    }

    /// Password from the environment if set, otherwise the data-dir key file.
    pub fn load(data_dir: &Path) -> Result<Self, VaultError> {
        match std::env::var(VAULT_PASSWORD_ENV) {
            Ok(password) if !password.is_empty() => Self::from_password(&password),
            _ => Self::from_key_file(&data_dir.join(KEY_FILE_NAME)),
        }
    }

    /// Returns `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| VaultError::EncryptionFailed)?;

        let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        result.extend_from_slice(&nonce);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, VaultError> {
        if data.len() < NONCE_SIZE {
            return Err(VaultError::CiphertextTooShort);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| VaultError::DecryptionFailed)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        tracing::warn!(error = %e, "Failed to restrict vault key permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}

fn rand_bytes() -> [u8; 32] {
    use aes_gcm::aead::rand_core::RngCore;
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("odd length hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            s.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| format!("invalid hex at position {i}"))
        })
        .collect()
}
