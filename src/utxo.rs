//! Unspent-output index
//!
//! One entry per currently-unspent output, keyed by outpoint. Entries are
//! created when a block connects or a transaction enters the pool, flagged
//! spent when consumed, and restored from undo records when a block
//! disconnects. The index never decides validity; it only answers lookups
//! and applies mutations the caller has already ruled on.

use std::collections::{HashMap, HashSet};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::hashing;
use crate::store::KvStore;
use crate::types::{Amount, Block, ByteString, Natural, OutPoint, Transaction};

/// Sentinel height for outputs of unconfirmed pool transactions. Distinct
/// from every chain height, so maturity rules can tell pool coins from
/// confirmed ones.
pub const MEMPOOL_HEIGHT: Natural = Natural::MAX;

/// Everything the rules need to know about one unspent output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutputInfo {
    pub amount: Amount,
    /// Commitment to the owning public key
    pub recipient: ByteString,
    /// Height of the creating block, or [`MEMPOOL_HEIGHT`]
    pub height: Natural,
    /// Whether the creating transaction was a coinbase
    pub coinbase: bool,
    pub spent: bool,
}

/// Read-only view of the unspent-output index.
///
/// Implemented by [`UtxoSet`] itself and by [`BlockOverlayView`]; rules only
/// ever see this trait, never the mutable set.
pub trait UtxoView {
    fn unspent_info(&self, outpoint: &OutPoint) -> Result<Option<UnspentOutputInfo>, StoreError>;
}

/// Undo record for one connected block: the prior state of every entry the
/// block's inputs consumed, in spend order. Produced at connect time and
/// required to disconnect; persistence is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockUndo {
    spent: Vec<(OutPoint, UnspentOutputInfo)>,
}

impl BlockUndo {
    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}

/// The unspent-output index over a key-value store.
#[derive(Debug)]
pub struct UtxoSet<S> {
    store: S,
}

impl<S: KvStore> UtxoSet<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn key(outpoint: &OutPoint) -> Vec<u8> {
        let mut key = Vec::with_capacity(40);
        key.extend_from_slice(&outpoint.hash);
        key.extend_from_slice(&outpoint.index.to_le_bytes());
        key
    }

    fn read(&self, outpoint: &OutPoint) -> Result<Option<UnspentOutputInfo>, StoreError> {
        match self.store.get(&Self::key(outpoint))? {
            Some(raw) => serde_json::from_slice(&raw)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    fn write(&mut self, outpoint: &OutPoint, info: &UnspentOutputInfo) -> Result<(), StoreError> {
        let raw = serde_json::to_vec(info).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.store.put(Self::key(outpoint), raw)
    }

    /// Insert a single entry. Bootstrap and test plumbing; block and pool
    /// mutations go through the `process_*` operations.
    pub fn insert(
        &mut self,
        outpoint: OutPoint,
        info: UnspentOutputInfo,
    ) -> Result<(), StoreError> {
        self.write(&outpoint, &info)
    }

    /// Apply a connecting block: flag each consumed entry spent, then insert
    /// one entry per created output at the block's height. Returns the undo
    /// record needed to disconnect the block again.
    pub fn process_block_connected(&mut self, block: &Block) -> Result<BlockUndo, StoreError> {
        let height = block.header.height;
        let mut undo = BlockUndo::default();
        for tx in &block.transactions {
            if !tx.is_coinbase() {
                for input in &tx.inputs {
                    let prior = self.read(&input.prevout)?.ok_or_else(|| {
                        StoreError::Corrupt(format!(
                            "no entry for spent outpoint {}:{}",
                            hashing::short_id(&input.prevout.hash),
                            input.prevout.index
                        ))
                    })?;
                    undo.spent.push((input.prevout.clone(), prior.clone()));
                    let mut flagged = prior;
                    flagged.spent = true;
                    self.write(&input.prevout, &flagged)?;
                }
            }
            self.insert_outputs(tx, height, tx.is_coinbase())?;
        }
        info!(
            "utxo: connected block {} at height {height}, {} spent",
            hashing::short_id(&block.hash()),
            undo.len()
        );
        Ok(undo)
    }

    /// Undo a connected block. Transactions are processed in reverse order;
    /// for each one, its own outputs are flagged spent and then the undo
    /// records of its inputs are restored verbatim. The interleaving matters
    /// for intra-block spend chains: a restored entry created by an earlier
    /// transaction of the same block is tombstoned again when that creator is
    /// itself undone. With the undo produced at connect time this returns the
    /// index to its exact prior content.
    pub fn process_block_disconnected(
        &mut self,
        block: &Block,
        undo: &BlockUndo,
    ) -> Result<(), StoreError> {
        // connect pushed one record per non-coinbase input in block order,
        // so walking both in reverse keeps records aligned with their tx
        let mut records = undo.spent.iter().rev();
        for tx in block.transactions.iter().rev() {
            let tx_id = tx.id();
            for index in 0..tx.outputs.len() {
                let outpoint = OutPoint {
                    hash: tx_id,
                    index: index as Natural,
                };
                if let Some(mut info) = self.read(&outpoint)? {
                    info.spent = true;
                    self.write(&outpoint, &info)?;
                }
            }
            if !tx.is_coinbase() {
                for _ in &tx.inputs {
                    let (outpoint, prior) = records.next().ok_or_else(|| {
                        StoreError::Corrupt(format!(
                            "undo record missing for block {}",
                            hashing::short_id(&block.hash())
                        ))
                    })?;
                    self.write(outpoint, prior)?;
                }
            }
        }
        if records.next().is_some() {
            return Err(StoreError::Corrupt(format!(
                "excess undo records for block {}",
                hashing::short_id(&block.hash())
            )));
        }
        info!(
            "utxo: disconnected block {} at height {}, {} restored",
            hashing::short_id(&block.hash()),
            block.header.height,
            undo.len()
        );
        Ok(())
    }

    /// Register an unconfirmed pool transaction's outputs at the sentinel
    /// height.
    pub fn register_pool_transaction(&mut self, tx: &Transaction) -> Result<(), StoreError> {
        self.insert_outputs(tx, MEMPOOL_HEIGHT, false)
    }

    fn insert_outputs(
        &mut self,
        tx: &Transaction,
        height: Natural,
        coinbase: bool,
    ) -> Result<(), StoreError> {
        let tx_id = tx.id();
        for (index, output) in tx.outputs.iter().enumerate() {
            let outpoint = OutPoint {
                hash: tx_id,
                index: index as Natural,
            };
            let info = UnspentOutputInfo {
                amount: output.amount,
                recipient: output.recipient.clone(),
                height,
                coinbase,
                spent: false,
            };
            self.write(&outpoint, &info)?;
        }
        Ok(())
    }
}

impl<S: KvStore> UtxoView for UtxoSet<S> {
    fn unspent_info(&self, outpoint: &OutPoint) -> Result<Option<UnspentOutputInfo>, StoreError> {
        self.read(outpoint)
    }
}

/// Overlay of a base view with the effects of transactions applied earlier
/// in the same block. Lets contextual connect checks resolve intra-block
/// spend chains and reject a second spend of the same outpoint.
pub struct BlockOverlayView<'a> {
    base: &'a dyn UtxoView,
    created: HashMap<OutPoint, UnspentOutputInfo>,
    consumed: HashSet<OutPoint>,
}

impl<'a> BlockOverlayView<'a> {
    pub fn new(base: &'a dyn UtxoView) -> Self {
        Self {
            base,
            created: HashMap::new(),
            consumed: HashSet::new(),
        }
    }

    /// Record a transaction already accepted into the block under check.
    pub fn add_transaction(&mut self, tx: &Transaction, height: Natural) {
        if !tx.is_coinbase() {
            for input in &tx.inputs {
                self.consumed.insert(input.prevout.clone());
            }
        }
        let tx_id = tx.id();
        for (index, output) in tx.outputs.iter().enumerate() {
            let outpoint = OutPoint {
                hash: tx_id,
                index: index as Natural,
            };
            self.created.insert(
                outpoint,
                UnspentOutputInfo {
                    amount: output.amount,
                    recipient: output.recipient.clone(),
                    height,
                    coinbase: tx.is_coinbase(),
                    spent: false,
                },
            );
        }
    }
}

impl UtxoView for BlockOverlayView<'_> {
    fn unspent_info(&self, outpoint: &OutPoint) -> Result<Option<UnspentOutputInfo>, StoreError> {
        let found = match self.created.get(outpoint) {
            Some(info) => Some(info.clone()),
            None => self.base.unspent_info(outpoint)?,
        };
        Ok(found.map(|mut info| {
            if self.consumed.contains(outpoint) {
                info.spent = true;
            }
            info
        }))
    }
}
