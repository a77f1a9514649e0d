use crate::types::{NodeIdentity, Slot};
use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

/// Both halves of one node's certificate pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertRecord {
    pub cert: Option<String>,
    pub key: Option<String>,
}

impl CertRecord {
    pub fn get(&self, slot: Slot) -> Option<&String> {
        match slot {
            Slot::Cert => self.cert.as_ref(),
            Slot::Key => self.key.as_ref(),
        }
    }

    pub fn set(&mut self, slot: Slot, blob: String) {
        match slot {
            Slot::Cert => self.cert = Some(blob),
            Slot::Key => self.key = Some(blob),
        }
    }
}

/// Process-local backend. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: RwLock<HashMap<NodeIdentity, CertRecord>>,
}

impl MemoryBackend {
    pub fn get(&self, identity: &NodeIdentity, slot: Slot) -> Option<String> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        records.get(identity)?.get(slot).cloned()
    }

    pub fn upsert(&self, identity: &NodeIdentity, blob: String, slot: Slot) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.entry(identity.clone()).or_default().set(slot, blob);
    }
}
