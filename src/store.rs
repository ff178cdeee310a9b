//! Key-value storage abstraction
//!
//! Only a get/put contract is assumed; durability and layout belong to the
//! surrounding node. Any failure here is fatal to the operation in progress.

use std::collections::HashMap;

use crate::error::StoreError;

/// Minimal storage contract consumed by the UTXO set.
pub trait KvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError>;
}

/// In-memory store backing tests and light deployments.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent point-in-time copy; reads against the snapshot are
    /// unaffected by later writes to this store.
    pub fn snapshot(&self) -> MemoryStore {
        self.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key, value);
        Ok(())
    }
}

/// Store double that refuses every operation. Exercises the fatal error
/// path that must never be misreported as a rule failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

impl KvStore for FailingStore {
    fn get(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn put(&mut self, _key: Vec<u8>, _value: Vec<u8>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}
