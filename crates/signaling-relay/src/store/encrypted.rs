//! Sealed file repository for the ledger.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use async_trait::async_trait;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use signaling_medium::{Ledger, Repository, RepositoryError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Domain separator mixed into the sealing key.
const KEY_DERIVATION_PATH: &str = "signaling-relay/ledger";

/// Nonce size for AES-GCM (96 bits = 12 bytes).
const NONCE_SIZE: usize = 12;

/// Derive the 32-byte sealing key: `SHA256(path || secret)`.
pub fn derive_key(secret: &SecretString) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(KEY_DERIVATION_PATH.as_bytes());
    hasher.update(secret.expose_secret().as_bytes());
    hasher.finalize().into()
}

/// Encrypt with a fresh random nonce.
///
/// Output format: [12 bytes nonce][ciphertext with auth tag]
pub fn seal(plaintext: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, RepositoryError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| RepositoryError::Sealing("AES-GCM encryption failed".into()))?;

    let mut data = nonce_bytes.to_vec();
    data.extend(ciphertext);
    Ok(data)
}

/// Decrypt data produced by [`seal`]; fails if it was modified.
pub fn unseal(data: &[u8], key: &[u8; 32]) -> Result<Vec<u8>, RepositoryError> {
    if data.len() < NONCE_SIZE {
        return Err(RepositoryError::Sealing(format!(
            "Sealed data too short: {} bytes",
            data.len()
        )));
    }

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);

    cipher.decrypt(nonce, &data[NONCE_SIZE..]).map_err(|_| {
        RepositoryError::Sealing(
            "Failed to unseal ledger: wrong secret or tampered file".to_string(),
        )
    })
}

/// Ledger snapshot sealed with AES-256-GCM on local disk.
pub struct EncryptedFileRepository {
    storage_path: PathBuf,
    key: [u8; 32],
}

impl EncryptedFileRepository {
    pub fn new(storage_path: PathBuf, secret: &SecretString) -> Self {
        Self::with_key(storage_path, derive_key(secret))
    }

    /// Create a repository with a pre-derived key.
    pub fn with_key(storage_path: PathBuf, key: [u8; 32]) -> Self {
        Self { storage_path, key }
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Check if a sealed ledger file exists.
    pub fn exists(&self) -> bool {
        self.storage_path.exists()
    }
}

#[async_trait]
impl Repository for EncryptedFileRepository {
    async fn load(&self) -> Result<Option<Ledger>, RepositoryError> {
        if !self.exists() {
            info!(
                "Ledger file not found at {:?}, starting with empty ledger",
                self.storage_path
            );
            return Ok(None);
        }

        let data = fs::read(&self.storage_path).await?;
        let plaintext = unseal(&data, &self.key)?;
        let ledger: Ledger = serde_json::from_slice(&plaintext)?;

        info!(
            "Loaded sealed ledger with {} participants from {:?}",
            ledger.registry().len(),
            self.storage_path
        );
        Ok(Some(ledger))
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), RepositoryError> {
        let plaintext = serde_json::to_vec(ledger)?;
        let data = seal(&plaintext, &self.key)?;

        // Ensure parent directory exists
        if let Some(parent) = self.storage_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write atomically using temp file + rename
        let temp_path = self.storage_path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.storage_path).await?;

        debug!(
            "Saved sealed ledger ({} bytes) to {:?}",
            data.len(),
            self.storage_path
        );
        Ok(())
    }
}
