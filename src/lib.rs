//! Consensus validation kernel for a UTXO ledger
//!
//! This crate decides whether transactions and blocks satisfy the consensus
//! rules. It holds no sockets, no threads and no event loop; the surrounding
//! node feeds it candidates together with read-only views of its state and
//! receives a verdict back.
//!
//! # Architecture
//!
//! Every check is an ordered list of named rules run by a generic
//! fail-fast engine ([`rulebook::RuleBook`]). Rules read one per-call
//! [`context::FactContext`] carrying the candidate, the frozen
//! [`params::ConsensusParams`] and the collaborator views
//! ([`utxo::UtxoView`], [`chain::ChainView`],
//! [`signature::SignatureVerifier`]). A negative verdict names the failing
//! rule, down to the failing leaf for nested checks; a collaborator outage
//! is an error, never a verdict.
//!
//! Blocks move through three lifecycle rule lists
//! ([`block::INCOMING_BLOCK_RULES`], [`block::POST_ORPHAN_RULES`],
//! [`block::CONNECT_BLOCK_RULES`]); transactions have a structural list and
//! a full admission list ([`transaction::TX_ADMISSION_RULES`]). The
//! unspent-output index ([`utxo::UtxoSet`]) applies block effects and
//! produces undo records, but never decides validity itself.
//!
//! # Example
//!
//! ```
//! use consensus_kernel::{
//!     ConsensusParamsBuilder, MemoryStore, NullVerifier, RuleId, Transaction,
//!     TransactionValidator, UtxoSet, TX_ADMISSION_RULES,
//! };
//!
//! let params = ConsensusParamsBuilder::default().freeze();
//! let utxo = UtxoSet::new(MemoryStore::new());
//! let validator = TransactionValidator::new(&params, &utxo, &NullVerifier, 0);
//!
//! let malformed = Transaction {
//!     inputs: vec![],
//!     outputs: vec![],
//! };
//! let verdict = validator
//!     .validate(&malformed, TX_ADMISSION_RULES, true)
//!     .unwrap();
//! assert!(!verdict.passed);
//! assert_eq!(verdict.failing_rule(), Some(RuleId::TxInputsStructural));
//! ```

pub mod block;
pub mod chain;
pub mod context;
pub mod error;
pub mod hashing;
pub mod params;
mod registry;
pub mod rulebook;
pub mod signature;
pub mod store;
pub mod transaction;
pub mod types;
pub mod utxo;

pub use block::{
    BlockStatus, BlockValidator, BlockVerdict, CONNECT_BLOCK_RULES, INCOMING_BLOCK_RULES,
    POST_ORPHAN_RULES,
};
pub use chain::{ChainView, MemoryChain, StoredBlock};
pub use context::FactContext;
pub use error::{Result, StoreError, ValidationError};
pub use params::{ConsensusParams, ConsensusParamsBuilder};
pub use rulebook::{RuleBook, RuleBookResult, RuleId, RuleOutcome};
pub use signature::{recipient_commitment, NullVerifier, Secp256k1Verifier, SignatureVerifier};
pub use store::{FailingStore, KvStore, MemoryStore};
pub use transaction::{TransactionValidator, TX_ADMISSION_RULES, TX_STRUCTURAL_RULES};
pub use types::{
    Amount, Block, BlockHeader, ByteString, Hash, Natural, OutPoint, Transaction,
    TransactionInput, TransactionOutput, COINBASE_INDEX, ZERO_HASH,
};
pub use utxo::{
    BlockOverlayView, BlockUndo, UnspentOutputInfo, UtxoSet, UtxoView, MEMPOOL_HEIGHT,
};
