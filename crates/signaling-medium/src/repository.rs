//! Persistence abstraction for the ledger.

use crate::error::RepositoryError;
use crate::ledger::Ledger;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Persistent store backing a [`SignalingMedium`](crate::SignalingMedium).
///
/// `save` is called with the complete staged ledger before a transition is
/// committed; an error aborts the transition.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    /// Load the last saved ledger, `None` if nothing was ever saved.
    async fn load(&self) -> Result<Option<Ledger>, RepositoryError>;

    /// Replace the stored ledger.
    async fn save(&self, ledger: &Ledger) -> Result<(), RepositoryError>;
}

/// Repository that keeps the last saved snapshot in memory.
///
/// Data is lost when the process exits.
#[derive(Default)]
pub struct MemoryRepository {
    snapshot: RwLock<Option<Ledger>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot.
    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            snapshot: RwLock::new(Some(ledger)),
        }
    }

    /// Copy of the last saved snapshot.
    pub async fn snapshot(&self) -> Option<Ledger> {
        self.snapshot.read().await.clone()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn load(&self) -> Result<Option<Ledger>, RepositoryError> {
        debug!("Memory repository: load");
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, ledger: &Ledger) -> Result<(), RepositoryError> {
        debug!("Memory repository: save");
        *self.snapshot.write().await = Some(ledger.clone());
        Ok(())
    }
}
