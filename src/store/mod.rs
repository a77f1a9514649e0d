//! Identity-scoped storage for certificate pairs.
//!
//! A [`CertStore`] wraps one of two backends, picked once from the
//! configuration: an in-process map that is lost on restart, or a
//! directory holding one file per identity and slot. Callers only see
//! `init`, `get` and `upsert`.
//!
//! Access is serialized per identity. Requests for different nodes never
//! wait on each other, and the lock is held only for the backend call.

use crate::{
    configs::{StorageBackend, StorageConfig},
    error::AppResult,
    types::{NodeIdentity, Slot},
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};
use tokio::sync::{Mutex, OwnedMutexGuard};

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

#[derive(Debug)]
pub enum Backend {
    Memory(MemoryBackend),
    File(FileBackend),
}

#[derive(Debug)]
pub struct CertStore {
    backend: Backend,
    locks: IdentityLocks,
}

impl CertStore {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            locks: IdentityLocks::default(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        let backend = match config.backend {
            StorageBackend::Memory => Backend::Memory(MemoryBackend::default()),
            StorageBackend::File => Backend::File(FileBackend::new(&config.directory)),
        };
        Self::new(backend)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Prepares the backend. The file backend fails here when its directory
    /// cannot be written to and read back.
    pub async fn init(&self) -> AppResult<()> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::File(backend) => backend.init().await,
        }
    }

    /// Returns the blob stored for `(identity, slot)`, or `None` on a miss.
    pub async fn get(&self, identity: &NodeIdentity, slot: Slot) -> Option<String> {
        let _guard = self.locks.acquire(identity).await;
        match &self.backend {
            Backend::Memory(backend) => backend.get(identity, slot),
            Backend::File(backend) => backend.get(identity, slot).await,
        }
    }

    /// Replaces whatever is stored for `(identity, slot)` with `blob`.
    pub async fn upsert(&self, identity: &NodeIdentity, blob: String, slot: Slot) -> AppResult<()> {
        let _guard = self.locks.acquire(identity).await;
        match &self.backend {
            Backend::Memory(backend) => {
                backend.upsert(identity, blob, slot);
                Ok(())
            }
            Backend::File(backend) => backend.upsert(identity, blob, slot).await,
        }
    }
}

/// One async mutex per identity, created on first use.
#[derive(Debug, Default)]
struct IdentityLocks {
    locks: StdMutex<HashMap<NodeIdentity, Arc<Mutex<()>>>>,
}

impl IdentityLocks {
    async fn acquire(&self, identity: &NodeIdentity) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Drop locks nobody is holding or waiting on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(identity.clone())
                .or_insert_with(Default::default)
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
