//! Read-only chain view
//!
//! Fork choice and block-tree management live outside this crate; validation
//! only needs indexed lookup into whatever the surrounding node considers
//! the current main chain.

use std::collections::{HashMap, HashSet};

use crate::error::StoreError;
use crate::types::{Block, Hash, Natural};

/// A block as the chain store knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlock {
    pub block: Block,
    /// Verdict the node recorded when it accepted the block.
    pub valid: bool,
}

/// Lookup contract the block rules consume. Unavailability of the backing
/// storage surfaces as [`StoreError`], never as a rule failure.
pub trait ChainView {
    fn block_by_hash(&self, hash: &Hash) -> Result<Option<StoredBlock>, StoreError>;
    fn block_by_height(&self, height: Natural) -> Result<Option<StoredBlock>, StoreError>;
    fn tip(&self) -> Result<Option<StoredBlock>, StoreError>;
    /// Whether a coinbase with this identifier already exists in the chain.
    fn coinbase_seen(&self, tx_id: &Hash) -> Result<bool, StoreError>;
}

/// In-memory chain index for tests and light embedding.
#[derive(Debug, Default)]
pub struct MemoryChain {
    by_hash: HashMap<Hash, StoredBlock>,
    main: Vec<Hash>,
    coinbase_ids: HashSet<Hash>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block and the verdict it received.
    pub fn insert(&mut self, block: Block, valid: bool) {
        let hash = block.hash();
        self.by_hash.insert(hash, StoredBlock { block, valid });
    }

    /// Mark a stored block as the next main-chain entry and index its
    /// coinbase identifier.
    pub fn extend_main(&mut self, block: &Block) {
        self.main.push(block.hash());
        if let Some(coinbase) = block.transactions.first() {
            self.coinbase_ids.insert(coinbase.id());
        }
    }
}

impl ChainView for MemoryChain {
    fn block_by_hash(&self, hash: &Hash) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self.by_hash.get(hash).cloned())
    }

    fn block_by_height(&self, height: Natural) -> Result<Option<StoredBlock>, StoreError> {
        match self.main.get(height as usize) {
            Some(hash) => self.block_by_hash(hash),
            None => Ok(None),
        }
    }

    fn tip(&self) -> Result<Option<StoredBlock>, StoreError> {
        match self.main.last() {
            Some(hash) => self.block_by_hash(hash),
            None => Ok(None),
        }
    }

    fn coinbase_seen(&self, tx_id: &Hash) -> Result<bool, StoreError> {
        Ok(self.coinbase_ids.contains(tx_id))
    }
}
