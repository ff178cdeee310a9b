//! Consensus parameters
//!
//! Protocol constants are gathered into one bundle, built mutably and then
//! frozen. Every validation call reads the same immutable snapshot, so a
//! parameter change can never be observed mid-evaluation.

use crate::types::{Amount, Hash, Natural};

/// Mutable configuration form of [`ConsensusParams`].
///
/// Defaults match the main network; tests override individual fields and
/// freeze the result.
#[derive(Debug, Clone)]
pub struct ConsensusParamsBuilder {
    max_block_size: usize,
    max_nonce_size: usize,
    coinbase_maturity_depth: Natural,
    block_reward: Amount,
    minimum_transaction_fee: Amount,
    target_compact: u32,
}

impl Default for ConsensusParamsBuilder {
    fn default() -> Self {
        Self {
            max_block_size: 1_000_000,
            max_nonce_size: 16,
            coinbase_maturity_depth: 100,
            block_reward: 50 * 100_000_000,
            minimum_transaction_fee: 1,
            target_compact: 0x1d00_ffff,
        }
    }
}

impl ConsensusParamsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_block_size(mut self, bytes: usize) -> Self {
        self.max_block_size = bytes;
        self
    }

    pub fn max_nonce_size(mut self, bytes: usize) -> Self {
        self.max_nonce_size = bytes;
        self
    }

    pub fn coinbase_maturity_depth(mut self, blocks: Natural) -> Self {
        self.coinbase_maturity_depth = blocks;
        self
    }

    pub fn block_reward(mut self, amount: Amount) -> Self {
        self.block_reward = amount;
        self
    }

    pub fn minimum_transaction_fee(mut self, amount: Amount) -> Self {
        self.minimum_transaction_fee = amount;
        self
    }

    /// Compact form of the proof-of-work threshold; expanded once at freeze.
    pub fn target_compact(mut self, compact: u32) -> Self {
        self.target_compact = compact;
        self
    }

    /// Freeze into the immutable snapshot consumed by validation.
    pub fn freeze(self) -> ConsensusParams {
        ConsensusParams {
            target_value: expand_target(self.target_compact),
            max_block_size: self.max_block_size,
            max_nonce_size: self.max_nonce_size,
            coinbase_maturity_depth: self.coinbase_maturity_depth,
            block_reward: self.block_reward,
            minimum_transaction_fee: self.minimum_transaction_fee,
        }
    }
}

/// Immutable consensus parameter bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusParams {
    max_block_size: usize,
    max_nonce_size: usize,
    coinbase_maturity_depth: Natural,
    block_reward: Amount,
    minimum_transaction_fee: Amount,
    target_value: Hash,
}

impl ConsensusParams {
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn max_nonce_size(&self) -> usize {
        self.max_nonce_size
    }

    pub fn coinbase_maturity_depth(&self) -> Natural {
        self.coinbase_maturity_depth
    }

    pub fn block_reward(&self) -> Amount {
        self.block_reward
    }

    pub fn minimum_transaction_fee(&self) -> Amount {
        self.minimum_transaction_fee
    }

    /// Expanded 256-bit proof-of-work threshold, cached at freeze time.
    pub fn target_value(&self) -> &Hash {
        &self.target_value
    }
}

/// Expand a compact target (exponent byte, three mantissa bytes) into the
/// full big-endian 256-bit threshold: mantissa * 256^(exponent - 3).
fn expand_target(compact: u32) -> Hash {
    let exponent = (compact >> 24) as usize;
    let mantissa = [
        (compact >> 16) as u8,
        (compact >> 8) as u8,
        compact as u8,
    ];
    let mut target = [0u8; 32];
    for (i, byte) in mantissa.iter().enumerate() {
        // most significant mantissa byte lands at index 32 - exponent
        if let Some(pos) = (32 - exponent as isize + i as isize)
            .try_into()
            .ok()
            .filter(|p: &usize| *p < 32)
        {
            target[pos] = *byte;
        }
    }
    target
}
