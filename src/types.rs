//! Core domain types for consensus validation

use serde::{Deserialize, Serialize};

use crate::hashing;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Natural number type
pub type Natural = u64;

/// Amount type, in the smallest currency unit
pub type Amount = u64;

/// The all-zero hash
pub const ZERO_HASH: Hash = [0u8; 32];

/// Reserved output index marking a coinbase input
pub const COINBASE_INDEX: Natural = 0xffff_ffff;

/// Reference to a single transaction output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: Natural,
}

impl OutPoint {
    /// The reserved prevout carried by a coinbase input.
    pub fn coinbase() -> Self {
        Self {
            hash: ZERO_HASH,
            index: COINBASE_INDEX,
        }
    }
}

/// Transaction input: the outpoint it consumes plus the proof of ownership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    /// Compact ECDSA signature over the transaction signing payload
    pub signature: ByteString,
    /// Public key whose commitment must match the referenced output's recipient
    pub public_key: ByteString,
}

/// Transaction output: an amount locked to a recipient commitment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub amount: Amount,
    /// 20-byte commitment to the owning public key
    pub recipient: ByteString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Transaction identifier: SHA-256d over the canonical encoding.
    pub fn id(&self) -> Hash {
        hashing::transaction_id(self)
    }

    /// A coinbase transaction has exactly one input carrying the reserved
    /// prevout (zero hash, coinbase index).
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout == OutPoint::coinbase()
    }

    /// Sum of output amounts; `None` on overflow.
    pub fn output_total(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.amount))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub prev_hash: Hash,
    pub merkle_root: Hash,
    pub height: Natural,
    pub timestamp: Natural,
    /// Proof-of-work threshold the block claims to satisfy
    pub target: Hash,
    /// Variable-length nonce, bounded by consensus parameters
    pub nonce: ByteString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Block identifier: SHA-256d over the canonically encoded header.
    pub fn hash(&self) -> Hash {
        hashing::block_hash(&self.header)
    }
}
