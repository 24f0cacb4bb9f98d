//! Ledger persistence backends.

mod encrypted;

pub use encrypted::{derive_key, seal, unseal, EncryptedFileRepository};

use crate::config::StoreConfig;
use secrecy::SecretString;
use signaling_medium::{MemoryRepository, Repository};
use std::sync::Arc;
use tracing::{info, warn};

/// Pick the repository for a store configuration.
///
/// Persistence needs a sealing secret; without one the relay falls back to
/// memory and the ledger is lost on restart.
pub fn open_repository(config: &StoreConfig) -> Arc<dyn Repository> {
    if !config.persist {
        info!("Persistence disabled, using in-memory ledger");
        return Arc::new(MemoryRepository::new());
    }

    match &config.secret {
        Some(secret) => {
            info!("Using sealed ledger at {:?}", config.path);
            let secret = SecretString::new(secret.clone());
            Arc::new(EncryptedFileRepository::new(config.path.clone(), &secret))
        }
        None => {
            warn!("No STORE__SECRET configured, using in-memory ledger (data will be lost on restart)");
            Arc::new(MemoryRepository::new())
        }
    }
}
